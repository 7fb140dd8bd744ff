//! Trait seams for the engine's external collaborators (spec §1 Non-goals,
//! §6 External interfaces): the raster catalogue and decoder are consumed,
//! never implemented, by the core. This module sketches them as traits the
//! same way `geoengine-operators` sketches `RasterQueryProcessor` /
//! `InitializedRasterOperator` as the seam between operator graphs and
//! concrete sources.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::listeners::ListenerList;
use crate::spatial::{CoordinateSystem, Envelope, GridGeometry, Rectangle};
use crate::time::{center_time, TimeInstant, TimeInterval};

/// Metadata for one sample band, the common layout all frames of a coverage
/// must agree on (spec §3: "constructing with heterogeneous band layouts
/// fails with `Inconsistent bands`").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBand {
    pub name: String,
    pub unit: String,
    pub no_data_value: Option<f64>,
    pub categorical: bool,
}

/// A decoded raster: a point-sampling function plus the metadata needed to
/// project into it. Implemented by the raster decoder (external, Non-goal).
pub trait Raster: fmt::Debug + Send + Sync {
    fn evaluate_f64(&self, point: crate::spatial::Point2D, dest: &mut [f64]);
    fn evaluate_f32(&self, point: crate::spatial::Point2D, dest: &mut [f32]);
    fn evaluate_i32(&self, point: crate::spatial::Point2D, dest: &mut [i32]);
    fn coordinate_system(&self) -> &CoordinateSystem;
    fn grid_geometry(&self) -> &GridGeometry;
    fn band_count(&self) -> usize;
}

/// Describes one frame of the chronological sequence before it is decoded.
/// Implemented by entries from the raster catalogue (external, Non-goal).
pub trait RasterDescriptor: fmt::Debug + Send + Sync {
    /// `None` for time-invariant data.
    fn time_range(&self) -> Option<TimeInterval>;

    fn envelope(&self) -> Envelope;
    fn geographic_area(&self) -> Rectangle;
    fn grid_geometry(&self) -> GridGeometry;
    fn sample_bands(&self) -> &[SampleBand];
    fn coordinate_system(&self) -> &CoordinateSystem;

    /// Decodes this frame, forwarding `listeners` to the decoder unchanged.
    fn materialize(&self, listeners: &ListenerList) -> std::result::Result<Box<dyn Raster>, crate::error::DecodeError>;

    /// Requests early termination of an in-flight decode. A no-op by
    /// default; descriptors backed by real I/O override it.
    fn abort(&self) {}

    /// Derived per spec §3: midpoint when both ends present, the present
    /// end when only one is, else the timeless sentinel.
    fn center_time(&self) -> TimeInstant {
        center_time(self.time_range())
    }
}

/// The injected operator the spec's Design Notes describe as replacing a
/// historical process-wide singleton: nearest-neighbor wrapping (used when
/// interpolation is disallowed) and the 2-D linear-combine used by the slice
/// builder (spec §4.E, §6).
pub trait RasterProcessor: fmt::Debug + Send + Sync {
    fn wrap_nearest_neighbor(&self, raster: Box<dyn Raster>) -> Box<dyn Raster>;

    /// `result = (1 - ratio) * lower + ratio * upper`, band-wise.
    fn linear_combine(
        &self,
        lower: &dyn Raster,
        upper: &dyn Raster,
        ratio: f64,
    ) -> std::result::Result<Box<dyn Raster>, crate::error::DecodeError>;
}
