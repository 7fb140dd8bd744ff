//! Progress/warning observer lists forwarded verbatim to the raster decoder.
//!
//! Mirrors the teacher's listener-list plumbing (`add_progress_listener` /
//! `remove_progress_listener` style APIs used throughout `geoengine-services`),
//! reduced to the synchronous, borrow-free shape the spec calls for: fired on
//! the calling thread, no channels, no async.

use std::fmt;
use std::sync::Arc;

pub trait ProgressListener: fmt::Debug {
    fn on_progress(&self, fraction: f64);
}

pub trait WarningListener: fmt::Debug {
    fn on_warning(&self, message: &str);
}

#[derive(Debug, Default, Clone)]
pub struct ListenerList {
    progress: Vec<Arc<dyn ProgressListener + Send + Sync>>,
    warning: Vec<Arc<dyn WarningListener + Send + Sync>>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_progress_listener(&mut self, listener: Arc<dyn ProgressListener + Send + Sync>) {
        self.progress.push(listener);
    }

    pub fn remove_progress_listener(&mut self, listener: &Arc<dyn ProgressListener + Send + Sync>) {
        self.progress.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn add_warning_listener(&mut self, listener: Arc<dyn WarningListener + Send + Sync>) {
        self.warning.push(listener);
    }

    pub fn remove_warning_listener(&mut self, listener: &Arc<dyn WarningListener + Send + Sync>) {
        self.warning.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn fire_progress(&self, fraction: f64) {
        for listener in &self.progress {
            listener.on_progress(fraction);
        }
    }

    /// Fires to every registered listener and also logs, so a warning is
    /// visible even with no listeners registered.
    pub fn fire_warning(&self, message: &str) {
        log::warn!("{message}");
        for listener in &self.warning {
            listener.on_warning(message);
        }
    }
}
