//! Progress Reporter (spec.md §4.6, §9).

use serde::{Deserialize, Serialize};

/// A structured status update invoked during orchestration.
///
/// `total_steps` may be revised upward mid-run when "any" scanners
/// contribute new systems (spec.md §9 "'Any' scanners dynamic step count").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub system_id: String,
    pub step: u64,
    pub total_steps: u64,
    pub files_so_far: u64,
}

/// Callback invoked at least once per system: once at start, once at
/// completion, and once per committed batch within a system.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event);
    }
}

/// A [`ProgressReporter`] that does nothing; useful as a default in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn on_progress(&self, _event: ProgressEvent) {}
}
