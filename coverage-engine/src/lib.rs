//! The coverage engine: a chronologically-ordered sequence of raster frames
//! exposed as a continuous spatio-temporal field, plus an unrelated geodetic
//! path tracker used by the same callers to log movement (spec §1 OVERVIEW).
//!
//! Plays the role `geoengine-operators` plays on top of `geoengine-datatypes`:
//! this crate supplies the stateful query logic, `coverage-datatypes` supplies
//! the shared value types and the external trait seams.

mod engine;
mod error;
mod path;
mod slot_cache;
mod time_index;

pub use engine::{CoverageEngine, EngineOptions, SeekOutcome};
pub use error::{Error, Result};
pub use path::{IntegerRectangle, Path, PathSnapshot};
