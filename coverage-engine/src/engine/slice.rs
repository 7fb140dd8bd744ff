//! §4.E Slice: a whole interpolated raster at one instant, cached across
//! repeated calls at the same instant (spec §8 "slice caching").

use std::sync::Arc;

use coverage_datatypes::{Raster, RasterDescriptor, TimeInstant};

use super::evaluator::temporal_ratio;
use super::{CoverageEngine, SeekOutcome};
use crate::error::Result;

/// Ratios within this distance of an endpoint are treated as exact hits on
/// that endpoint's raster rather than run through `linear_combine` (spec
/// §4.E: "epsilon cutoff near either end returns the endpoint raster
/// directly").
const EPSILON: f64 = 1e-6;

impl<D: RasterDescriptor> CoverageEngine<D> {
    /// Returns the whole raster valid at `instant`, or `None` on a seek miss
    /// (spec §4.E, §7: slice never raises `OutsideCoverage`/`Miss` itself —
    /// it surfaces the miss as `Ok(None)`).
    pub fn get_slice(&self, instant: TimeInstant) -> Result<Option<Arc<dyn Raster>>> {
        let mut state = self.state.lock().expect("engine mutex poisoned");
        match self.seek(instant, &mut state)? {
            SeekOutcome::Miss => Ok(None),
            SeekOutcome::Hit => {
                if state.slot_cache.is_pinned() {
                    let raster = state
                        .slot_cache
                        .lower
                        .clone()
                        .expect("pinned cache has a lower slot")
                        .raster;
                    return Ok(Some(raster));
                }

                if let Some((cached_instant, raster)) = &state.last_interpolated {
                    if *cached_instant == instant {
                        return Ok(Some(raster.clone()));
                    }
                }

                let lower = state.slot_cache.lower.clone().expect("bracketed cache has a lower slot");
                let upper = state.slot_cache.upper.clone().expect("bracketed cache has an upper slot");
                let ratio = temporal_ratio(instant, lower.center_time, upper.center_time);

                let raster: Arc<dyn Raster> = if float_cmp::approx_eq!(f64, ratio, 0.0, epsilon = EPSILON) {
                    lower.raster.clone()
                } else if float_cmp::approx_eq!(f64, ratio, 1.0, epsilon = EPSILON) {
                    upper.raster.clone()
                } else if state.interpolation_allowed {
                    Arc::from(self.processor.linear_combine(lower.raster.as_ref(), upper.raster.as_ref(), ratio)?)
                } else {
                    // Tie-break toward the later frame, matching `seek`'s
                    // nearest-neighbor fallback.
                    if ratio >= 0.5 { upper.raster.clone() } else { lower.raster.clone() }
                };

                state.last_interpolated = Some((instant, raster.clone()));
                Ok(Some(raster))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use coverage_datatypes::test_util::{MockRasterDescriptor, MockRasterProcessor, TestDefault};
    use coverage_datatypes::{CoordinateSystem, Envelope, GridGeometry, Point2D, Rectangle, SampleBand, TimeInterval};

    use super::*;
    use crate::engine::EngineOptions;

    fn band() -> Vec<SampleBand> {
        vec![SampleBand {
            name: "value".into(),
            unit: "unitless".into(),
            no_data_value: None,
            categorical: false,
        }]
    }

    fn domain() -> Rectangle {
        Rectangle::test_default()
    }

    fn grid() -> GridGeometry {
        GridGeometry::test_default()
    }

    fn frame(center_millis: i64, half_width_millis: i64, value: f64) -> MockRasterDescriptor {
        let cs = CoordinateSystem::engine_default();
        let time_range = TimeInterval::new_unchecked(
            TimeInstant::from_millis(center_millis - half_width_millis),
            TimeInstant::from_millis(center_millis + half_width_millis),
        );
        MockRasterDescriptor {
            time_range: Some(time_range),
            envelope: Envelope {
                spatial: domain(),
                time: Some(time_range),
            },
            geographic_area: domain(),
            grid_geometry: grid(),
            sample_bands: band(),
            coordinate_system: cs,
            domain: domain(),
            values: vec![value],
            cancelled: Mutex::new(false),
            fail_materialize: false,
        }
    }

    fn engine(frames: Vec<MockRasterDescriptor>, options: EngineOptions) -> CoverageEngine<MockRasterDescriptor> {
        CoverageEngine::new(frames, options, Box::new(MockRasterProcessor)).unwrap()
    }

    #[test]
    fn pinned_slice_returns_raw_raster() {
        let eng = engine(vec![frame(100, 50, 10.0)], EngineOptions::default());
        let slice = eng.get_slice(TimeInstant::from_millis(100)).unwrap().unwrap();
        let mut dest = [0.0];
        slice.evaluate_f64(Point2D { x: 0.0, y: 0.0 }, &mut dest);
        assert_eq!(dest, [10.0]);
    }

    #[test]
    fn bracketed_slice_is_linearly_blended() {
        let eng = engine(vec![frame(100, 50, 0.0), frame(200, 50, 10.0)], EngineOptions::default());
        let slice = eng.get_slice(TimeInstant::from_millis(150)).unwrap().unwrap();
        let mut dest = [0.0];
        slice.evaluate_f64(Point2D { x: 0.0, y: 0.0 }, &mut dest);
        assert_eq!(dest, [5.0]);
    }

    #[test]
    fn epsilon_cutoff_returns_endpoint_raster_directly() {
        let eng = engine(vec![frame(100, 50, 0.0), frame(200, 50, 10.0)], EngineOptions::default());
        let slice = eng.get_slice(TimeInstant::from_millis(100)).unwrap().unwrap();
        let mut dest = [0.0];
        slice.evaluate_f64(Point2D { x: 0.0, y: 0.0 }, &mut dest);
        assert_eq!(dest, [0.0]);
    }

    #[test]
    fn repeated_calls_at_same_instant_hit_the_cache() {
        let eng = engine(vec![frame(100, 50, 0.0), frame(200, 50, 10.0)], EngineOptions::default());
        let a = eng.get_slice(TimeInstant::from_millis(150)).unwrap().unwrap();
        let b = eng.get_slice(TimeInstant::from_millis(150)).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn gap_miss_yields_none() {
        let eng = engine(vec![frame(100, 10, 0.0), frame(500, 10, 10.0)], EngineOptions::default());
        assert!(eng.get_slice(TimeInstant::from_millis(300)).unwrap().is_none());
    }

    #[test]
    fn empty_catalogue_yields_ok_none_not_an_error() {
        let eng: CoverageEngine<MockRasterDescriptor> = engine(vec![], EngineOptions::default());
        assert!(eng.get_slice(TimeInstant::from_millis(0)).unwrap().is_none());
    }
}
