//! Progress reporting for batch runs.
//!
//! Pipelines report through [`ProgressCallback`] and never touch a terminal
//! directly; the binary decides whether that means an `indicatif` bar or
//! nothing at all.

use std::sync::Arc;

/// Receives progress updates from a long-running batch.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of inputs the batch will visit.
    fn set_total(&self, total: u64);

    /// Advances by `delta` inputs.
    fn inc(&self, delta: u64);

    /// Replaces the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the batch finished with a closing message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
