//! Geometry and coordinate-system plumbing.
//!
//! Point and rectangle representations are re-exports of `geo-types`, the
//! crate the teacher already depends on for exactly this purpose.

use serde::{Deserialize, Serialize};

use crate::error::{IncompatibleCoordinateSystemsSnafu, InvalidCoordinateSystemSnafu, Result};
use snafu::ensure;

pub type Point2D = geo_types::Coord<f64>;
pub type Rectangle = geo_types::Rect<f64>;

/// Identifies a coordinate reference system. Two `CoordinateSystem`s with the
/// same `id` but a different [`AxisLayout`] are considered the same horizontal
/// reference differing only in axis order, which the engine knows how to
/// reconcile. Different `id`s are an unsupported mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSystemId(pub String);

impl CoordinateSystemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Positions of the time axis and the two spatial axes within a coordinate
/// system's coordinate tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLayout {
    pub time_axis: usize,
    pub x_axis: usize,
    pub y_axis: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub id: CoordinateSystemId,
    pub axes: AxisLayout,
}

impl CoordinateSystem {
    pub fn new(id: CoordinateSystemId, axes: AxisLayout) -> Result<Self> {
        ensure!(
            axes.time_axis != axes.x_axis && axes.time_axis != axes.y_axis && axes.x_axis != axes.y_axis,
            InvalidCoordinateSystemSnafu { axes }
        );
        Ok(Self { id, axes })
    }

    /// A stock 2-D-space + 1-time-axis system used when an empty catalogue
    /// leaves the engine with no frame to adopt a coordinate system from.
    pub fn engine_default() -> Self {
        Self {
            id: CoordinateSystemId::new("ENGINE:DEFAULT"),
            axes: AxisLayout {
                x_axis: 0,
                y_axis: 1,
                time_axis: 2,
            },
        }
    }

    /// The horizontal axis order: `true` if `x` precedes `y` in the tuple.
    fn x_before_y(&self) -> bool {
        self.axes.x_axis < self.axes.y_axis
    }

    /// Projects `point`, expressed in `self`, into `target`.
    ///
    /// The core supports exactly one kind of mismatch between coordinate
    /// systems: a swapped horizontal axis order within the *same* underlying
    /// reference (`id`). Anything else — a genuinely different reference —
    /// is `IncompatibleCoordinateSystems`; the core never resamples or
    /// reprojects coordinate values.
    pub fn project_point(&self, target: &CoordinateSystem, point: Point2D) -> Result<Point2D> {
        if self.id != target.id {
            return IncompatibleCoordinateSystemsSnafu {
                from: self.id.0.clone(),
                into: target.id.0.clone(),
            }
            .fail();
        }
        if self.x_before_y() == target.x_before_y() {
            Ok(point)
        } else {
            Ok(Point2D {
                x: point.y,
                y: point.x,
            })
        }
    }

    /// Projects a rectangle the same way, by projecting its two corners.
    pub fn project_rectangle(&self, target: &CoordinateSystem, rect: Rectangle) -> Result<Rectangle> {
        let min = self.project_point(target, rect.min())?;
        let max = self.project_point(target, rect.max())?;
        Ok(Rectangle::new(min, max))
    }
}

/// An integer cell range `[min, max)` for one axis of a grid, i.e. `max` is
/// the exclusive count bound (`max - min` cells along that axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl CellRange {
    pub fn clamp_x(&self, cell_x: f64) -> f64 {
        cell_x.clamp(self.min_x as f64, (self.max_x - 1) as f64)
    }

    pub fn clamp_y(&self, cell_y: f64) -> f64 {
        cell_y.clamp(self.min_y as f64, (self.max_y - 1) as f64)
    }
}

/// A grid-to-world affine transform plus the grid's integer cell range, used
/// by the snap operation (spec §4.F) and by mock rasters in tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub origin: Point2D,
    pub cell_size: (f64, f64),
    pub cell_range: CellRange,
}

impl GridGeometry {
    pub fn world_to_grid(&self, point: Point2D) -> (f64, f64) {
        (
            (point.x - self.origin.x) / self.cell_size.0,
            (point.y - self.origin.y) / self.cell_size.1,
        )
    }

    pub fn grid_to_world(&self, cell: (f64, f64)) -> Point2D {
        Point2D {
            x: self.origin.x + cell.0 * self.cell_size.0,
            y: self.origin.y + cell.1 * self.cell_size.1,
        }
    }

    /// Rounds `point` to the center of the nearest in-range grid cell.
    pub fn snap_to_nearest_cell(&self, point: Point2D) -> Point2D {
        let (gx, gy) = self.world_to_grid(point);
        let cx = self.cell_range.clamp_x(gx.round());
        let cy = self.cell_range.clamp_y(gy.round());
        self.grid_to_world((cx, cy))
    }
}

/// A spatio-temporal bounding box in some coordinate system's native space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub spatial: Rectangle,
    pub time: Option<crate::time::TimeInterval>,
}

impl Envelope {
    pub fn union(&self, other: &Self) -> Self {
        let min_x = self.spatial.min().x.min(other.spatial.min().x);
        let min_y = self.spatial.min().y.min(other.spatial.min().y);
        let max_x = self.spatial.max().x.max(other.spatial.max().x);
        let max_y = self.spatial.max().y.max(other.spatial.max().y);
        let time = match (self.time, other.time) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        Self {
            spatial: Rectangle::new(Point2D { x: min_x, y: min_y }, Point2D { x: max_x, y: max_y }),
            time,
        }
    }

    pub fn default_empty() -> Self {
        Self {
            spatial: Rectangle::new(Point2D { x: 0.0, y: 0.0 }, Point2D { x: 0.0, y: 0.0 }),
            time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(x_axis: usize, y_axis: usize, time_axis: usize) -> CoordinateSystem {
        CoordinateSystem::new(
            CoordinateSystemId::new("SAME"),
            AxisLayout {
                x_axis,
                y_axis,
                time_axis,
            },
        )
        .unwrap()
    }

    #[test]
    fn project_point_identity_same_axis_order() {
        let a = cs(0, 1, 2);
        let b = cs(0, 1, 2);
        let p = Point2D { x: 1.0, y: 2.0 };
        assert_eq!(a.project_point(&b, p).unwrap(), p);
    }

    #[test]
    fn project_point_swaps_on_axis_reorder() {
        let a = cs(0, 1, 2);
        let b = cs(1, 0, 2);
        let p = Point2D { x: 1.0, y: 2.0 };
        let projected = a.project_point(&b, p).unwrap();
        assert_eq!(projected, Point2D { x: 2.0, y: 1.0 });
    }

    #[test]
    fn project_point_rejects_different_reference() {
        let a = cs(0, 1, 2);
        let b = CoordinateSystem::new(
            CoordinateSystemId::new("OTHER"),
            AxisLayout {
                x_axis: 0,
                y_axis: 1,
                time_axis: 2,
            },
        )
        .unwrap();
        assert!(a.project_point(&b, Point2D { x: 0.0, y: 0.0 }).is_err());
    }

    #[test]
    fn snap_clamps_and_rounds_to_cell_center() {
        let geometry = GridGeometry {
            origin: Point2D { x: 0.0, y: 0.0 },
            cell_size: (1.0, 1.0),
            cell_range: CellRange {
                min_x: 0,
                min_y: 0,
                max_x: 4,
                max_y: 4,
            },
        };
        let snapped = geometry.snap_to_nearest_cell(Point2D { x: 0.7, y: 0.3 });
        assert_eq!(snapped, Point2D { x: 1.0, y: 0.0 });

        // out-of-range ordinates clamp into the grid
        let snapped = geometry.snap_to_nearest_cell(Point2D { x: 99.0, y: -99.0 });
        assert_eq!(snapped, Point2D { x: 3.0, y: 0.0 });
    }
}
