//! Chronological instants and intervals.
//!
//! Mirrors the sentinel-based approach `geoengine_datatypes::primitives::TimeInstant`
//! takes for unbounded time (`i64::MIN`/`i64::MAX`), plus a third sentinel for the
//! "timeless" (time-invariant) case the spec calls out separately from an open bound.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{InvalidTimeIntervalSnafu, Result};
use snafu::ensure;

/// An instant in milliseconds. Three reserved values carry special meaning:
/// [`TimeInstant::TIMELESS`] (no temporal axis at all), and
/// [`TimeInstant::NEG_INFINITY`] / [`TimeInstant::POS_INFINITY`] for an open bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeInstant(i64);

impl TimeInstant {
    /// Sentinel for a descriptor that has no temporal extent whatsoever.
    pub const TIMELESS: TimeInstant = TimeInstant(i64::MIN);
    /// Sentinel for an unbounded start.
    pub const NEG_INFINITY: TimeInstant = TimeInstant(i64::MIN + 1);
    /// Sentinel for an unbounded end.
    pub const POS_INFINITY: TimeInstant = TimeInstant(i64::MAX);

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    pub fn is_timeless(self) -> bool {
        self == Self::TIMELESS
    }

    /// True for an instant that is neither a sentinel nor an open bound.
    pub fn is_finite(self) -> bool {
        self != Self::TIMELESS && self != Self::NEG_INFINITY && self != Self::POS_INFINITY
    }

    pub fn midpoint(self, other: Self) -> Self {
        let mid = (i128::from(self.0) + i128::from(other.0)) / 2;
        Self(mid as i64)
    }

    /// Saturating `self + millis`, used for gap-tolerance arithmetic so a huge
    /// `max_time_gap` cannot overflow past [`TimeInstant::POS_INFINITY`].
    pub fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for TimeInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::TIMELESS {
            write!(f, "timeless")
        } else if *self == Self::NEG_INFINITY {
            write!(f, "-inf")
        } else if *self == Self::POS_INFINITY {
            write!(f, "+inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    start: TimeInstant,
    end: TimeInstant,
}

impl TimeInterval {
    pub fn new(start: TimeInstant, end: TimeInstant) -> Result<Self> {
        ensure!(start <= end, InvalidTimeIntervalSnafu { start, end });
        Ok(Self { start, end })
    }

    pub fn new_unchecked(start: TimeInstant, end: TimeInstant) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> TimeInstant {
        self.start
    }

    pub fn end(&self) -> TimeInstant {
        self.end
    }

    pub fn contains(&self, instant: TimeInstant) -> bool {
        self.start <= instant && instant < self.end
    }

    /// The smallest interval containing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// `center_time` as defined in the spec's data model: the midpoint when both
/// ends of `range` are finite, the one finite end when only one is present,
/// and [`TimeInstant::TIMELESS`] when `range` is absent or fully unbounded.
pub fn center_time(range: Option<TimeInterval>) -> TimeInstant {
    match range {
        None => TimeInstant::TIMELESS,
        Some(r) => match (r.start().is_finite(), r.end().is_finite()) {
            (true, true) => r.start().midpoint(r.end()),
            (true, false) => r.start(),
            (false, true) => r.end(),
            (false, false) => TimeInstant::TIMELESS,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_time_midpoint() {
        let r = TimeInterval::new_unchecked(TimeInstant::from_millis(100), TimeInstant::from_millis(200));
        assert_eq!(center_time(Some(r)), TimeInstant::from_millis(150));
    }

    #[test]
    fn center_time_open_end() {
        let r = TimeInterval::new_unchecked(TimeInstant::from_millis(100), TimeInstant::POS_INFINITY);
        assert_eq!(center_time(Some(r)), TimeInstant::from_millis(100));
    }

    #[test]
    fn center_time_open_start() {
        let r = TimeInterval::new_unchecked(TimeInstant::NEG_INFINITY, TimeInstant::from_millis(200));
        assert_eq!(center_time(Some(r)), TimeInstant::from_millis(200));
    }

    #[test]
    fn center_time_absent_is_timeless() {
        assert_eq!(center_time(None), TimeInstant::TIMELESS);
    }

    #[test]
    fn interval_contains_is_half_open() {
        let r = TimeInterval::new_unchecked(TimeInstant::from_millis(0), TimeInstant::from_millis(10));
        assert!(r.contains(TimeInstant::from_millis(0)));
        assert!(r.contains(TimeInstant::from_millis(9)));
        assert!(!r.contains(TimeInstant::from_millis(10)));
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        assert!(TimeInterval::new(TimeInstant::from_millis(10), TimeInstant::from_millis(0)).is_err());
    }
}
