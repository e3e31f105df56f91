use std::sync::Arc;

use crate::foundation::error::ReelResult;
use crate::job::model::JobId;

/// Side store receiving human-readable stage strings keyed by job id.
pub trait ProgressSink: Send + Sync {
    /// Record the latest stage for `job`. Last write wins.
    fn record(&self, job: &JobId, message: &str) -> ReelResult<()>;
}

/// Best-effort progress reporting for one job.
///
/// Sink failures are logged and swallowed; a missing or broken sink never fails the job.
#[derive(Clone)]
pub struct ProgressReporter {
    job: JobId,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressReporter {
    /// Reporter for `job` writing to `sink` (if any).
    pub fn new(job: JobId, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self { job, sink }
    }

    /// The job this reporter writes for.
    pub fn job(&self) -> &JobId {
        &self.job
    }

    /// Report a stage. Never fails.
    pub fn report(&self, message: &str) {
        tracing::info!(job = %self.job, "{message}");
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if let Err(e) = sink.record(&self.job, message) {
            tracing::warn!(job = %self.job, error = %e, "progress sink rejected update");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/progress.rs"]
mod tests;
