//! §4.F Snap: rounds an instant to the nearest frame's center time, and a
//! point to that frame's nearest grid cell center.

use coverage_datatypes::{Point2D, RasterDescriptor, TimeInstant};

use super::CoverageEngine;
use crate::error::Result;

impl<D: RasterDescriptor> CoverageEngine<D> {
    /// Snaps `instant` to the nearest frame's center time (ties favor the
    /// later frame) and, if `point` is given, snaps it to that frame's
    /// nearest grid cell center (spec §4.F).
    pub fn snap(&self, point: Option<Point2D>, instant: TimeInstant) -> Result<(Option<Point2D>, TimeInstant)> {
        if self.time_index.is_empty() {
            return Ok((point, instant));
        }

        let mut nearest = 0;
        let mut best_distance = i64::MAX;
        for index in 0..self.time_index.len() {
            let center = self.time_index.center_time(index);
            if center.is_timeless() {
                continue;
            }
            let distance = (instant.as_millis() - center.as_millis()).abs();
            if distance < best_distance || (distance == best_distance && center > self.time_index.center_time(nearest))
            {
                best_distance = distance;
                nearest = index;
            }
        }

        let snapped_center = self.time_index.center_time(nearest);
        let snapped_instant = if snapped_center.is_timeless() { instant } else { snapped_center };

        let snapped_point = match point {
            None => None,
            Some(point) => {
                let descriptor = self.time_index.descriptor(nearest);
                let projected = self
                    .coordinate_system
                    .project_point(descriptor.coordinate_system(), point)?;
                Some(descriptor.grid_geometry().snap_to_nearest_cell(projected))
            }
        };

        Ok((snapped_point, snapped_instant))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use coverage_datatypes::test_util::{MockRasterDescriptor, MockRasterProcessor, TestDefault};
    use coverage_datatypes::{CoordinateSystem, Envelope, GridGeometry, Rectangle, SampleBand, TimeInterval};

    use super::*;
    use crate::engine::EngineOptions;

    fn domain() -> Rectangle {
        Rectangle::test_default()
    }

    fn grid() -> GridGeometry {
        GridGeometry::test_default()
    }

    fn frame(center_millis: i64) -> MockRasterDescriptor {
        let time_range = TimeInterval::new_unchecked(
            TimeInstant::from_millis(center_millis - 10),
            TimeInstant::from_millis(center_millis + 10),
        );
        MockRasterDescriptor {
            time_range: Some(time_range),
            envelope: Envelope {
                spatial: domain(),
                time: Some(time_range),
            },
            geographic_area: domain(),
            grid_geometry: grid(),
            sample_bands: vec![SampleBand {
                name: "value".into(),
                unit: "unitless".into(),
                no_data_value: None,
                categorical: false,
            }],
            coordinate_system: CoordinateSystem::engine_default(),
            domain: domain(),
            values: vec![1.0],
            cancelled: Mutex::new(false),
            fail_materialize: false,
        }
    }

    #[test]
    fn snaps_instant_to_nearest_center_time() {
        let eng = CoverageEngine::new(
            vec![frame(100), frame(200), frame(300)],
            EngineOptions::default(),
            Box::new(MockRasterProcessor),
        )
        .unwrap();
        let (_, instant) = eng.snap(None, TimeInstant::from_millis(240)).unwrap();
        assert_eq!(instant, TimeInstant::from_millis(200));
    }

    #[test]
    fn ties_favor_the_later_frame() {
        let eng = CoverageEngine::new(
            vec![frame(100), frame(200)],
            EngineOptions::default(),
            Box::new(MockRasterProcessor),
        )
        .unwrap();
        let (_, instant) = eng.snap(None, TimeInstant::from_millis(150)).unwrap();
        assert_eq!(instant, TimeInstant::from_millis(200));
    }

    #[test]
    fn snaps_point_to_nearest_cell_center() {
        let eng = CoverageEngine::new(vec![frame(100)], EngineOptions::default(), Box::new(MockRasterProcessor)).unwrap();
        let (point, _) = eng.snap(Some(Point2D { x: 0.6, y: 0.4 }), TimeInstant::from_millis(100)).unwrap();
        assert_eq!(point, Some(Point2D { x: 1.0, y: 0.0 }));
    }
}
