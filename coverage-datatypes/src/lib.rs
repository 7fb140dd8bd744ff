//! Value types and trait seams shared by the coverage engine.
//!
//! This crate plays the role `geoengine-datatypes` plays for
//! `geoengine-operators`: reusable, decoder-agnostic types (time, geometry,
//! coordinate systems, sample bands) plus the trait seams
//! (`Raster`, `RasterDescriptor`, `RasterProcessor`) the engine crate
//! builds its stateful logic on top of.

pub mod error;
pub mod listeners;
pub mod raster;
pub mod spatial;
pub mod test_util;
pub mod time;

pub use error::{DecodeError, Error, Result};
pub use listeners::{ListenerList, ProgressListener, WarningListener};
pub use raster::{Raster, RasterDescriptor, RasterProcessor, SampleBand};
pub use spatial::{AxisLayout, CellRange, CoordinateSystem, CoordinateSystemId, Envelope, GridGeometry, Point2D, Rectangle};
pub use time::{center_time, TimeInstant, TimeInterval};
