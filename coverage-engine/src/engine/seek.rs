//! §4.C Seek state machine.

use coverage_datatypes::{RasterDescriptor, TimeInstant};

use super::{CoverageEngine, EngineState};
use crate::error::{OutsideCoverageSnafu, Result};
use crate::time_index::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    Hit,
    Miss,
}

impl<D: RasterDescriptor> CoverageEngine<D> {
    /// Positions the slot cache so it is valid for `instant`, deterministically
    /// (spec §4.C). Must be called with the engine's state lock already held.
    pub(crate) fn seek(&self, instant: TimeInstant, state: &mut EngineState) -> Result<SeekOutcome> {
        if state.slot_cache.contains(instant) {
            return Ok(SeekOutcome::Hit);
        }

        let offset = self.time_index.timeless_prefix_len();
        let total = self.time_index.len();

        // A fully empty catalogue is a documented soft `Miss` (spec §8
        // Boundary behaviors: "every evaluate returns Miss fill"), not an
        // `OutsideCoverage` failure. Only-timeless, non-empty catalogues
        // still fail: a real instant is never inside a timeless frame's
        // (non-existent) time range, so there is no frame for it to hit.
        if total == 0 {
            return Ok(SeekOutcome::Miss);
        }
        if offset == total {
            return OutsideCoverageSnafu { instant }.fail();
        }

        match self.time_index.search(instant) {
            SearchResult::Exact(index) => {
                self.load_index(index, state)?;
                Ok(SeekOutcome::Hit)
            }
            SearchResult::Insertion(index) if index == offset => {
                self.load_boundary(offset, instant, state)
            }
            SearchResult::Insertion(index) if index == total => {
                self.load_boundary(total - 1, instant, state)
            }
            SearchResult::Insertion(index) => self.seek_interior(index - 1, index, instant, state),
        }
    }

    fn load_boundary(&self, index: usize, instant: TimeInstant, state: &mut EngineState) -> Result<SeekOutcome> {
        let contains = self
            .time_index
            .time_range(index)
            .is_some_and(|range| range.contains(instant));
        if contains {
            self.load_index(index, state)?;
            Ok(SeekOutcome::Hit)
        } else {
            OutsideCoverageSnafu { instant }.fail()
        }
    }

    fn seek_interior(
        &self,
        lo: usize,
        hi: usize,
        instant: TimeInstant,
        state: &mut EngineState,
    ) -> Result<SeekOutcome> {
        let lo_range = self
            .time_index
            .time_range(lo)
            .expect("interior frame below the timeless prefix always has a time range");
        let hi_range = self
            .time_index
            .time_range(hi)
            .expect("interior frame below the timeless prefix always has a time range");

        // `>=`, not `>`: strictly adjacent-ending/starting frames are
        // contiguous (spec §4.C "Gap test", §9 Open Question).
        let contiguous = lo_range.end().saturating_add_millis(self.max_time_gap_millis) >= hi_range.start();

        if contiguous {
            if state.interpolation_allowed {
                self.load_pair(lo, hi, state)?;
                Ok(SeekOutcome::Hit)
            } else {
                let lo_center = self.time_index.center_time(lo);
                let hi_center = self.time_index.center_time(hi);
                let distance_to_lo = (instant.as_millis() - lo_center.as_millis()).abs();
                let distance_to_hi = (instant.as_millis() - hi_center.as_millis()).abs();
                // Tie-break toward the later frame.
                let nearest = if distance_to_hi <= distance_to_lo { hi } else { lo };
                self.load_index(nearest, state)?;
                Ok(SeekOutcome::Hit)
            }
        } else if lo_range.contains(instant) {
            self.load_index(lo, state)?;
            Ok(SeekOutcome::Hit)
        } else if hi_range.contains(instant) {
            self.load_index(hi, state)?;
            Ok(SeekOutcome::Hit)
        } else {
            Ok(SeekOutcome::Miss)
        }
    }

    fn load_index(&self, index: usize, state: &mut EngineState) -> Result<()> {
        let listeners = self.listeners_snapshot();
        let interpolation_allowed = state.interpolation_allowed;
        state.slot_cache.load_single(
            self.time_index.descriptor(index),
            index,
            &listeners,
            self.processor.as_ref(),
            !interpolation_allowed,
        )?;
        state.last_interpolated = None;
        Ok(())
    }

    fn load_pair(&self, lo: usize, hi: usize, state: &mut EngineState) -> Result<()> {
        let listeners = self.listeners_snapshot();
        state.slot_cache.load_pair(
            self.time_index.descriptor(lo),
            lo,
            self.time_index.descriptor(hi),
            hi,
            &listeners,
        )?;
        state.last_interpolated = None;
        Ok(())
    }
}
