//! Mock implementations of the catalogue/decoder seam, used by this crate's
//! own tests and by `coverage-engine`'s. Mirrors
//! `geoengine_datatypes::util::test::TestDefault` and the teacher's
//! `MockRasterSource`: a convenient, in-memory stand-in for the real
//! catalogue/decoder so tests never need I/O or an async runtime.

use std::sync::Mutex;

use geo::Contains;

use crate::error::DecodeError;
use crate::listeners::ListenerList;
use crate::raster::{Raster, RasterDescriptor, RasterProcessor, SampleBand};
use crate::spatial::{CoordinateSystem, Envelope, GridGeometry, Point2D, Rectangle};
use crate::time::TimeInterval;

/// Constructs a conventional default value for tests, the way
/// `geoengine_datatypes::util::test::TestDefault` does for query contexts
/// and tiling specifications.
pub trait TestDefault {
    fn test_default() -> Self;
}

/// A 10x10 unit grid anchored at the origin, reused across this crate's and
/// `coverage-engine`'s tests in place of hand-rolling the same geometry per
/// test module.
impl TestDefault for GridGeometry {
    fn test_default() -> Self {
        GridGeometry {
            origin: Point2D { x: 0.0, y: 0.0 },
            cell_size: (1.0, 1.0),
            cell_range: crate::spatial::CellRange {
                min_x: 0,
                min_y: 0,
                max_x: 10,
                max_y: 10,
            },
        }
    }
}

/// A whole-globe-ish domain (`[-180, 180] x [-90, 90]`) wide enough that
/// mock raster test fixtures never need to worry about being clipped.
impl TestDefault for Rectangle {
    fn test_default() -> Self {
        Rectangle::new(Point2D { x: -180.0, y: -90.0 }, Point2D { x: 180.0, y: 90.0 })
    }
}

/// A raster with one constant value per band everywhere inside `domain`, and
/// no-data outside it.
#[derive(Debug, Clone)]
pub struct MockRaster {
    pub coordinate_system: CoordinateSystem,
    pub grid_geometry: GridGeometry,
    pub domain: Rectangle,
    pub values: Vec<f64>,
}

impl Raster for MockRaster {
    fn evaluate_f64(&self, point: Point2D, dest: &mut [f64]) {
        let inside = rectangle_contains(&self.domain, point);
        for (d, v) in dest.iter_mut().zip(&self.values) {
            *d = if inside { *v } else { f64::NAN };
        }
    }

    fn evaluate_f32(&self, point: Point2D, dest: &mut [f32]) {
        let inside = rectangle_contains(&self.domain, point);
        for (d, v) in dest.iter_mut().zip(&self.values) {
            *d = if inside { *v as f32 } else { f32::NAN };
        }
    }

    fn evaluate_i32(&self, point: Point2D, dest: &mut [i32]) {
        let inside = rectangle_contains(&self.domain, point);
        for (d, v) in dest.iter_mut().zip(&self.values) {
            *d = if inside { v.round() as i32 } else { 0 };
        }
    }

    fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    fn grid_geometry(&self) -> &GridGeometry {
        &self.grid_geometry
    }

    fn band_count(&self) -> usize {
        self.values.len()
    }
}

fn rectangle_contains(rect: &Rectangle, point: Point2D) -> bool {
    rect.contains(&point)
}

/// Wraps a raster so every query point first snaps to the nearest grid cell
/// center, the behavior `wrap_with_nearest_neighbor` gives the slot cache
/// when `interpolation_allowed == false` (spec §3, §6).
#[derive(Debug)]
pub struct NearestNeighborRaster {
    inner: Box<dyn Raster>,
}

impl Raster for NearestNeighborRaster {
    fn evaluate_f64(&self, point: Point2D, dest: &mut [f64]) {
        self.inner
            .evaluate_f64(self.inner.grid_geometry().snap_to_nearest_cell(point), dest);
    }

    fn evaluate_f32(&self, point: Point2D, dest: &mut [f32]) {
        self.inner
            .evaluate_f32(self.inner.grid_geometry().snap_to_nearest_cell(point), dest);
    }

    fn evaluate_i32(&self, point: Point2D, dest: &mut [i32]) {
        self.inner
            .evaluate_i32(self.inner.grid_geometry().snap_to_nearest_cell(point), dest);
    }

    fn coordinate_system(&self) -> &CoordinateSystem {
        self.inner.coordinate_system()
    }

    fn grid_geometry(&self) -> &GridGeometry {
        self.inner.grid_geometry()
    }

    fn band_count(&self) -> usize {
        self.inner.band_count()
    }
}

#[derive(Debug, Clone)]
pub struct MockRasterDescriptor {
    pub time_range: Option<TimeInterval>,
    pub envelope: Envelope,
    pub geographic_area: Rectangle,
    pub grid_geometry: GridGeometry,
    pub sample_bands: Vec<SampleBand>,
    pub coordinate_system: CoordinateSystem,
    pub domain: Rectangle,
    pub values: Vec<f64>,
    /// Set by `abort()` in tests that exercise cancellation.
    pub cancelled: Mutex<bool>,
    /// Set to force `materialize` to fail, for testing `EvaluationFailed`.
    pub fail_materialize: bool,
}

impl RasterDescriptor for MockRasterDescriptor {
    fn time_range(&self) -> Option<TimeInterval> {
        self.time_range
    }

    fn envelope(&self) -> Envelope {
        self.envelope
    }

    fn geographic_area(&self) -> Rectangle {
        self.geographic_area
    }

    fn grid_geometry(&self) -> GridGeometry {
        self.grid_geometry
    }

    fn sample_bands(&self) -> &[SampleBand] {
        &self.sample_bands
    }

    fn coordinate_system(&self) -> &CoordinateSystem {
        &self.coordinate_system
    }

    fn materialize(&self, _listeners: &ListenerList) -> Result<Box<dyn Raster>, DecodeError> {
        if *self.cancelled.lock().unwrap() {
            return crate::error::CancelledSnafu.fail();
        }
        if self.fail_materialize {
            return crate::error::IoSnafu {
                message: "mock decode failure".to_string(),
            }
            .fail();
        }
        Ok(Box::new(MockRaster {
            coordinate_system: self.coordinate_system.clone(),
            grid_geometry: self.grid_geometry,
            domain: self.domain,
            values: self.values.clone(),
        }))
    }

    fn abort(&self) {
        *self.cancelled.lock().unwrap() = true;
    }
}

/// Blends two `MockRaster`s band-wise; since their values are constant over
/// their domain, the combine can be computed eagerly rather than lazily.
#[derive(Debug, Default)]
pub struct MockRasterProcessor;

impl RasterProcessor for MockRasterProcessor {
    fn wrap_nearest_neighbor(&self, raster: Box<dyn Raster>) -> Box<dyn Raster> {
        Box::new(NearestNeighborRaster { inner: raster })
    }

    fn linear_combine(
        &self,
        lower: &dyn Raster,
        upper: &dyn Raster,
        ratio: f64,
    ) -> Result<Box<dyn Raster>, DecodeError> {
        let mut low = vec![0.0; lower.band_count()];
        let mut high = vec![0.0; upper.band_count()];
        let probe = lower.grid_geometry().origin;
        lower.evaluate_f64(probe, &mut low);
        upper.evaluate_f64(probe, &mut high);
        let values = low
            .iter()
            .zip(&high)
            .map(|(l, h)| (1.0 - ratio) * l + ratio * h)
            .collect();
        Ok(Box::new(MockRaster {
            coordinate_system: lower.coordinate_system().clone(),
            grid_geometry: *lower.grid_geometry(),
            domain: Rectangle::new(
                Point2D {
                    x: f64::NEG_INFINITY,
                    y: f64::NEG_INFINITY,
                },
                Point2D {
                    x: f64::INFINITY,
                    y: f64::INFINITY,
                },
            ),
            values,
        }))
    }
}
