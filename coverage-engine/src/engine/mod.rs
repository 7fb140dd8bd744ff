//! The coverage engine: components B-F of the spec wired together around a
//! single [`CoverageEngine`]. Construction (spec §3, §6 `new`) and the small
//! read-only accessors live here; `seek`, `evaluator`, `slice`, and `snap`
//! each get their own module, the way `geoengine-operators` splits a single
//! operator's initialize/query-processor/adapter concerns across files.

mod evaluator;
mod seek;
mod slice;
mod snap;

pub use seek::SeekOutcome;

use std::sync::{Arc, Mutex};

use chrono::Duration;
use coverage_datatypes::{
    CoordinateSystem, Envelope, ListenerList, ProgressListener, Raster, RasterDescriptor, RasterProcessor,
    Rectangle, SampleBand, TimeInstant, WarningListener,
};

use crate::error::Result;
use crate::slot_cache::SlotCache;
use crate::time_index::TimeIndex;

/// Construction-time tunables (spec §3 defaults: `max_time_gap` zero,
/// `interpolation_allowed` true), grouped the way the teacher groups small
/// `Copy` option structs like `TilingSpecification`.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub max_time_gap: Duration,
    pub interpolation_allowed: bool,
    pub target_coordinate_system: Option<CoordinateSystem>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_time_gap: Duration::zero(),
            interpolation_allowed: true,
            target_coordinate_system: None,
        }
    }
}

/// State guarded by a single mutex (spec §5: "a mutex or equivalent
/// serialization primitive guards the slot cache and `last_interpolated`"),
/// with `interpolation_allowed` folded in since flipping it must invalidate
/// the cache atomically with respect to any concurrent `seek`.
pub(crate) struct EngineState {
    pub slot_cache: SlotCache,
    pub last_interpolated: Option<(TimeInstant, Arc<dyn Raster>)>,
    pub interpolation_allowed: bool,
}

pub struct CoverageEngine<D: RasterDescriptor> {
    pub(crate) time_index: TimeIndex<D>,
    pub(crate) coordinate_system: CoordinateSystem,
    envelope: Envelope,
    geographic_area: Rectangle,
    bands: Vec<SampleBand>,
    pub(crate) max_time_gap_millis: i64,
    pub(crate) state: Mutex<EngineState>,
    pub(crate) processor: Box<dyn RasterProcessor>,
    listeners: Mutex<ListenerList>,
}

impl<D: RasterDescriptor> CoverageEngine<D> {
    /// Consumes the catalogue once, sorts it, and derives the engine's
    /// aggregate state (spec §3, §6 `new`).
    pub fn new(
        catalogue: impl IntoIterator<Item = D>,
        options: EngineOptions,
        processor: Box<dyn RasterProcessor>,
    ) -> Result<Self> {
        let frames: Vec<D> = catalogue.into_iter().collect();
        let coordinate_system = options
            .target_coordinate_system
            .clone()
            .or_else(|| frames.first().map(RasterDescriptor::coordinate_system).cloned())
            .unwrap_or_else(CoordinateSystem::engine_default);

        let time_index = TimeIndex::new(frames)?;
        let bands = time_index.bands().to_vec();

        let (envelope, geographic_area) = if time_index.is_empty() {
            (Envelope::default_empty(), Rectangle::new(
                coverage_datatypes::Point2D { x: 0.0, y: 0.0 },
                coverage_datatypes::Point2D { x: 0.0, y: 0.0 },
            ))
        } else {
            let mut envelope = None;
            let mut geographic_area: Option<Rectangle> = None;
            for index in 0..time_index.len() {
                let descriptor = time_index.descriptor(index);
                let projected_envelope = Envelope {
                    spatial: descriptor
                        .coordinate_system()
                        .project_rectangle(&coordinate_system, descriptor.envelope().spatial)?,
                    time: descriptor.envelope().time,
                };
                envelope = Some(match envelope {
                    Some(existing) => Envelope::union(&existing, &projected_envelope),
                    None => projected_envelope,
                });
                let area = descriptor.geographic_area();
                geographic_area = Some(match geographic_area {
                    Some(existing) => union_rectangles(existing, area),
                    None => area,
                });
            }
            (envelope.unwrap(), geographic_area.unwrap())
        };

        let max_time_gap_millis = options.max_time_gap.num_milliseconds().max(0);

        Ok(Self {
            time_index,
            coordinate_system,
            envelope,
            geographic_area,
            bands,
            max_time_gap_millis,
            state: Mutex::new(EngineState {
                slot_cache: SlotCache::default(),
                last_interpolated: None,
                interpolation_allowed: options.interpolation_allowed,
            }),
            processor,
            listeners: Mutex::new(ListenerList::new()),
        })
    }

    pub fn geographic_area(&self) -> Rectangle {
        self.geographic_area
    }

    /// The union time range over all frames, or `(TIMELESS, TIMELESS)` when
    /// every frame (or the whole catalogue) is time-invariant.
    pub fn time_range(&self) -> (TimeInstant, TimeInstant) {
        match self.envelope.time {
            Some(range) => (range.start(), range.end()),
            None => (TimeInstant::TIMELESS, TimeInstant::TIMELESS),
        }
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn sample_dimensions(&self) -> Vec<SampleBand> {
        self.bands.clone()
    }

    /// Flipping this invalidates the slot cache and the cached interpolated
    /// slice; the next `evaluate`/`get_slice` reloads (spec §8 boundary
    /// behaviors).
    pub fn set_interpolation_allowed(&self, allowed: bool) {
        let mut state = self.state.lock().expect("engine mutex poisoned");
        if state.interpolation_allowed != allowed {
            state.interpolation_allowed = allowed;
            state.slot_cache.invalidate();
            state.last_interpolated = None;
            log::info!("interpolation_allowed set to {allowed}; slot cache invalidated");
        }
    }

    pub fn add_progress_listener(&self, listener: Arc<dyn ProgressListener + Send + Sync>) {
        self.listeners.lock().expect("engine mutex poisoned").add_progress_listener(listener);
    }

    pub fn remove_progress_listener(&self, listener: &Arc<dyn ProgressListener + Send + Sync>) {
        self.listeners
            .lock()
            .expect("engine mutex poisoned")
            .remove_progress_listener(listener);
    }

    pub fn add_warning_listener(&self, listener: Arc<dyn WarningListener + Send + Sync>) {
        self.listeners.lock().expect("engine mutex poisoned").add_warning_listener(listener);
    }

    pub fn remove_warning_listener(&self, listener: &Arc<dyn WarningListener + Send + Sync>) {
        self.listeners
            .lock()
            .expect("engine mutex poisoned")
            .remove_warning_listener(listener);
    }

    pub(crate) fn listeners_snapshot(&self) -> ListenerList {
        self.listeners.lock().expect("engine mutex poisoned").clone()
    }
}

fn union_rectangles(a: Rectangle, b: Rectangle) -> Rectangle {
    let min_x = a.min().x.min(b.min().x);
    let min_y = a.min().y.min(b.min().y);
    let max_x = a.max().x.max(b.max().x);
    let max_y = a.max().y.max(b.max().y);
    Rectangle::new(
        coverage_datatypes::Point2D { x: min_x, y: min_y },
        coverage_datatypes::Point2D { x: max_x, y: max_y },
    )
}
