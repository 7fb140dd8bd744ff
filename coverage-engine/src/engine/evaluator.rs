//! §4.D Evaluator: point evaluation in three scalar flavors, with spatial
//! projection into each loaded frame and temporal blending that preserves
//! NaN semantics.

use std::sync::Arc;

use coverage_datatypes::{Point2D, Raster, RasterDescriptor, TimeInstant, TimeInterval};
use itertools::izip;

use super::CoverageEngine;
use crate::engine::SeekOutcome;
use crate::error::Result;

enum Selection {
    Miss,
    Pinned {
        raster: Arc<dyn Raster>,
        point: Point2D,
    },
    Bracketed {
        lower: Arc<dyn Raster>,
        upper: Arc<dyn Raster>,
        point_lower: Point2D,
        point_upper: Point2D,
        ratio: f64,
        lower_range: Option<TimeInterval>,
        upper_range: Option<TimeInterval>,
    },
}

impl<D: RasterDescriptor> CoverageEngine<D> {
    fn select(&self, point: Point2D, instant: TimeInstant) -> Result<Selection> {
        let mut state = self.state.lock().expect("engine mutex poisoned");
        match self.seek(instant, &mut state)? {
            SeekOutcome::Miss => Ok(Selection::Miss),
            SeekOutcome::Hit if state.slot_cache.is_pinned() => {
                let slot = state.slot_cache.lower.clone().expect("pinned cache has a lower slot");
                let projected = self.coordinate_system.project_point(slot.raster.coordinate_system(), point)?;
                Ok(Selection::Pinned {
                    raster: slot.raster,
                    point: projected,
                })
            }
            SeekOutcome::Hit => {
                let lower = state.slot_cache.lower.clone().expect("bracketed cache has a lower slot");
                let upper = state.slot_cache.upper.clone().expect("bracketed cache has an upper slot");
                let point_lower = self.coordinate_system.project_point(lower.raster.coordinate_system(), point)?;
                let point_upper = self.coordinate_system.project_point(upper.raster.coordinate_system(), point)?;
                let ratio = temporal_ratio(instant, lower.center_time, upper.center_time);
                Ok(Selection::Bracketed {
                    lower: lower.raster,
                    upper: upper.raster,
                    point_lower,
                    point_upper,
                    ratio,
                    lower_range: lower.time_range,
                    upper_range: upper.time_range,
                })
            }
        }
    }

    pub fn evaluate_f64(&self, point: Point2D, instant: TimeInstant, dest: Option<Vec<f64>>) -> Result<Vec<f64>> {
        let band_count = self.sample_dimensions().len();
        let mut dest = dest.unwrap_or_else(|| vec![0.0; band_count]);
        dest.resize(band_count, 0.0);

        match self.select(point, instant)? {
            Selection::Miss => dest.iter_mut().for_each(|v| *v = f64::NAN),
            Selection::Pinned { raster, point } => raster.evaluate_f64(point, &mut dest),
            Selection::Bracketed {
                lower,
                upper,
                point_lower,
                point_upper,
                ratio,
                lower_range,
                upper_range,
            } => {
                let mut low = vec![0.0; band_count];
                let mut high = vec![0.0; band_count];
                lower.evaluate_f64(point_lower, &mut low);
                upper.evaluate_f64(point_upper, &mut high);
                for (d, l, h) in izip!(dest.iter_mut(), &low, &high) {
                    *d = blend_float(*l, *h, ratio, lower_range, upper_range, instant);
                }
            }
        }
        Ok(dest)
    }

    pub fn evaluate_f32(&self, point: Point2D, instant: TimeInstant, dest: Option<Vec<f32>>) -> Result<Vec<f32>> {
        let band_count = self.sample_dimensions().len();
        let mut dest = dest.unwrap_or_else(|| vec![0.0; band_count]);
        dest.resize(band_count, 0.0);

        match self.select(point, instant)? {
            Selection::Miss => dest.iter_mut().for_each(|v| *v = f32::NAN),
            Selection::Pinned { raster, point } => raster.evaluate_f32(point, &mut dest),
            Selection::Bracketed {
                lower,
                upper,
                point_lower,
                point_upper,
                ratio,
                lower_range,
                upper_range,
            } => {
                let mut low = vec![0.0; band_count];
                let mut high = vec![0.0; band_count];
                lower.evaluate_f32(point_lower, &mut low);
                upper.evaluate_f32(point_upper, &mut high);
                for (d, l, h) in izip!(dest.iter_mut(), &low, &high) {
                    *d = blend_float(f64::from(*l), f64::from(*h), ratio, lower_range, upper_range, instant) as f32;
                }
            }
        }
        Ok(dest)
    }

    pub fn evaluate_i32(&self, point: Point2D, instant: TimeInstant, dest: Option<Vec<i32>>) -> Result<Vec<i32>> {
        let band_count = self.sample_dimensions().len();
        let mut dest = dest.unwrap_or_else(|| vec![0; band_count]);
        dest.resize(band_count, 0);

        match self.select(point, instant)? {
            Selection::Miss => dest.iter_mut().for_each(|v| *v = 0),
            Selection::Pinned { raster, point } => raster.evaluate_i32(point, &mut dest),
            Selection::Bracketed {
                lower,
                upper,
                point_lower,
                point_upper,
                ratio,
                ..
            } => {
                let mut low = vec![0; band_count];
                let mut high = vec![0; band_count];
                lower.evaluate_i32(point_lower, &mut low);
                upper.evaluate_i32(point_upper, &mut high);
                for (d, l, h) in izip!(dest.iter_mut(), &low, &high) {
                    let blended = f64::from(*l) + ratio * f64::from(h - l);
                    *d = blended.round() as i32;
                }
            }
        }
        Ok(dest)
    }

    /// Composes `[x, y, t]`, with `t` placed at the engine CS's pinned time
    /// axis index, into a point + instant and delegates (spec §4.D, §6).
    pub fn evaluate_f64_3d(&self, coordinate: [f64; 3], dest: Option<Vec<f64>>) -> Result<Vec<f64>> {
        let (point, instant) = self.decompose_3d(coordinate);
        self.evaluate_f64(point, instant, dest)
    }

    pub fn evaluate_f32_3d(&self, coordinate: [f64; 3], dest: Option<Vec<f32>>) -> Result<Vec<f32>> {
        let (point, instant) = self.decompose_3d(coordinate);
        self.evaluate_f32(point, instant, dest)
    }

    pub fn evaluate_i32_3d(&self, coordinate: [f64; 3], dest: Option<Vec<i32>>) -> Result<Vec<i32>> {
        let (point, instant) = self.decompose_3d(coordinate);
        self.evaluate_i32(point, instant, dest)
    }

    fn decompose_3d(&self, coordinate: [f64; 3]) -> (Point2D, TimeInstant) {
        let axes = self.coordinate_system.axes;
        let instant = TimeInstant::from_millis(coordinate[axes.time_axis] as i64);
        let point = Point2D {
            x: coordinate[axes.x_axis],
            y: coordinate[axes.y_axis],
        };
        (point, instant)
    }
}

pub(super) fn temporal_ratio(instant: TimeInstant, lower: TimeInstant, upper: TimeInstant) -> f64 {
    if lower == upper {
        0.0
    } else {
        (instant.as_millis() - lower.as_millis()) as f64 / (upper.as_millis() - lower.as_millis()) as f64
    }
}

/// The NaN-salvage rule (spec §4.D): a blend that comes out NaN is rescued
/// to the non-NaN side only when that side's own frame declares the
/// requested instant within its validity window — never extrapolated
/// beyond either frame's window.
fn blend_float(
    low: f64,
    high: f64,
    ratio: f64,
    lower_range: Option<TimeInterval>,
    upper_range: Option<TimeInterval>,
    instant: TimeInstant,
) -> f64 {
    let blend = low + ratio * (high - low);
    if !blend.is_nan() {
        return blend;
    }
    match (low.is_nan(), high.is_nan()) {
        (true, true) => f64::NAN,
        (true, false) => {
            if upper_range.is_some_and(|r| r.contains(instant)) {
                high
            } else {
                f64::NAN
            }
        }
        (false, true) => {
            if lower_range.is_some_and(|r| r.contains(instant)) {
                low
            } else {
                f64::NAN
            }
        }
        (false, false) => blend,
    }
}
