use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The engine's failure taxonomy (spec §7). `Miss` is deliberately *not* a
/// variant here: a query landing in a data hole is a documented, soft
/// outcome (`SeekOutcome::Miss`), not a propagated error, the same way a
/// `geoengine` query processor returning an empty tile stream isn't an
/// error either.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("OutsideCoverage: instant {instant} is outside the union of frame time ranges"))]
    OutsideCoverage {
        instant: coverage_datatypes::TimeInstant,
    },

    #[snafu(display("IncompatibleCoordinateSystems: {source}"))]
    IncompatibleCoordinateSystems {
        source: coverage_datatypes::Error,
    },

    #[snafu(display(
        "InconsistentBands: frame {index} has a different band layout than the first frame"
    ))]
    InconsistentBands { index: usize },

    #[snafu(display("EvaluationFailed: {source}"))]
    EvaluationFailed {
        source: coverage_datatypes::DecodeError,
    },
}

impl From<coverage_datatypes::Error> for Error {
    fn from(source: coverage_datatypes::Error) -> Self {
        Self::IncompatibleCoordinateSystems { source }
    }
}

impl From<coverage_datatypes::DecodeError> for Error {
    fn from(source: coverage_datatypes::DecodeError) -> Self {
        Self::EvaluationFailed { source }
    }
}
