//! §4.A Time index: a sorted chronological index of raster descriptors with
//! binary search by instant.

use coverage_datatypes::{center_time, RasterDescriptor, SampleBand, TimeInstant, TimeInterval};

use crate::error::{Error, InconsistentBandsSnafu, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Exact(usize),
    Insertion(usize),
}

/// Descriptors sorted strictly by `center_time` ascending (stable order
/// preserved for ties). Immutable after construction, so it may be read
/// concurrently (spec §5).
#[derive(Debug)]
pub struct TimeIndex<D> {
    frames: Vec<D>,
}

impl<D: RasterDescriptor> TimeIndex<D> {
    pub fn new(mut frames: Vec<D>) -> Result<Self> {
        if let Some(first) = frames.first() {
            let first_bands = first.sample_bands().to_vec();
            for (index, frame) in frames.iter().enumerate() {
                if frame.sample_bands() != first_bands.as_slice() {
                    return InconsistentBandsSnafu { index }.fail();
                }
            }
        }

        frames.sort_by(|a, b| center_time(a.time_range()).cmp(&center_time(b.time_range())));

        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn center_time(&self, index: usize) -> TimeInstant {
        center_time(self.frames[index].time_range())
    }

    pub fn time_range(&self, index: usize) -> Option<TimeInterval> {
        self.frames[index].time_range()
    }

    pub fn descriptor(&self, index: usize) -> &D {
        &self.frames[index]
    }

    pub fn bands(&self) -> &[SampleBand] {
        self.frames.first().map_or(&[], |d| d.sample_bands())
    }

    /// Count of leading timeless entries (spec §4.A: "timeless entries sort
    /// to index 0"). Timeless frames never participate in interpolation, so
    /// [`Self::search`] operates only on the remaining, real-time suffix —
    /// they stay loadable only by direct index, outside the instant-driven
    /// seek/evaluate flow.
    pub fn timeless_prefix_len(&self) -> usize {
        self.frames
            .iter()
            .take_while(|d| center_time(d.time_range()).is_timeless())
            .count()
    }

    /// Binary search by `center_time` over the non-timeless suffix.
    pub fn search(&self, instant: TimeInstant) -> SearchResult {
        let offset = self.timeless_prefix_len();
        let real = &self.frames[offset..];
        match real.binary_search_by(|d| center_time(d.time_range()).cmp(&instant)) {
            Ok(i) => SearchResult::Exact(i + offset),
            Err(i) => SearchResult::Insertion(i + offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverage_datatypes::test_util::{MockRasterDescriptor, TestDefault};
    use coverage_datatypes::{CoordinateSystem, Envelope, GridGeometry, Rectangle};
    use std::sync::Mutex;

    fn frame(center_millis: Option<i64>) -> MockRasterDescriptor {
        let cs = CoordinateSystem::engine_default();
        let grid_geometry = GridGeometry::test_default();
        let domain = Rectangle::test_default();
        let time_range = center_millis.map(|c| {
            TimeInterval::new_unchecked(TimeInstant::from_millis(c - 50), TimeInstant::from_millis(c + 50))
        });
        MockRasterDescriptor {
            time_range,
            envelope: Envelope {
                spatial: domain,
                time: time_range,
            },
            geographic_area: domain,
            grid_geometry,
            sample_bands: vec![],
            coordinate_system: cs,
            domain,
            values: vec![1.0],
            cancelled: Mutex::new(false),
            fail_materialize: false,
        }
    }

    #[test]
    fn empty_index_yields_insertion_zero() {
        let index: TimeIndex<MockRasterDescriptor> = TimeIndex::new(vec![]).unwrap();
        assert_eq!(index.search(TimeInstant::from_millis(0)), SearchResult::Insertion(0));
    }

    #[test]
    fn exact_and_insertion_hits() {
        let index = TimeIndex::new(vec![frame(Some(100)), frame(Some(200)), frame(Some(300))]).unwrap();
        assert_eq!(index.search(TimeInstant::from_millis(200)), SearchResult::Exact(1));
        assert_eq!(index.search(TimeInstant::from_millis(250)), SearchResult::Insertion(2));
        assert_eq!(index.search(TimeInstant::from_millis(50)), SearchResult::Insertion(0));
        assert_eq!(index.search(TimeInstant::from_millis(350)), SearchResult::Insertion(3));
    }

    #[test]
    fn timeless_entries_sort_first_and_are_skipped_by_search() {
        let index = TimeIndex::new(vec![frame(None), frame(Some(100)), frame(Some(200))]).unwrap();
        assert_eq!(index.center_time(0), TimeInstant::TIMELESS);
        assert_eq!(index.search(TimeInstant::from_millis(50)), SearchResult::Insertion(1));
    }

    #[test]
    fn inconsistent_bands_is_rejected() {
        let mut second = frame(Some(200));
        second.sample_bands = vec![coverage_datatypes::SampleBand {
            name: "x".into(),
            unit: "x".into(),
            no_data_value: None,
            categorical: false,
        }];
        let err = TimeIndex::new(vec![frame(Some(100)), second]).unwrap_err();
        assert!(matches!(err, Error::InconsistentBands { index: 1 }));
    }
}
