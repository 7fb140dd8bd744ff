use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the value types and trait seams in this crate.
///
/// The engine crate wraps this `Error` into its own broader taxonomy
/// (`coverage_engine::error::Error`), the same way `geoengine-operators`
/// wraps `geoengine_datatypes::error::Error`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "InvalidTimeInterval: start {start:?} is after end {end:?}"
    ))]
    InvalidTimeInterval {
        start: crate::time::TimeInstant,
        end: crate::time::TimeInstant,
    },

    #[snafu(display(
        "InvalidCoordinateSystem: axis layout {axes:?} does not place the time axis at a \
         position distinct from the spatial axes"
    ))]
    InvalidCoordinateSystem { axes: crate::spatial::AxisLayout },

    #[snafu(display(
        "IncompatibleCoordinateSystems: cannot project a point from {from} into {into} \
         (not merely an axis reordering)"
    ))]
    IncompatibleCoordinateSystems { from: String, into: String },
}

/// The cause a raster decoder attaches to a failed `materialize` call —
/// I/O failure or cancellation. Wrapped by the engine crate's
/// `EvaluationFailed { source }` variant.
#[derive(Debug, Snafu)]
pub enum DecodeError {
    #[snafu(display("raster decode failed: {message}"))]
    Io { message: String },

    #[snafu(display("raster decode was cancelled"))]
    Cancelled,
}
