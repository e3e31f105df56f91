use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::{JobId, JobKind, JobRecord, JobStatus};
use crate::job::progress::ProgressSink;

/// How long finished records stay queryable by default.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct Entry {
    record: JobRecord,
    finished_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, ttl: Duration, now: Instant) -> bool {
        self.finished_at
            .is_some_and(|t| now.saturating_duration_since(t) >= ttl)
    }
}

/// In-memory job status store shared by workers and status pollers.
///
/// Records are mutated only while non-terminal; updates to a terminal record are ignored.
/// Terminal records are dropped once they are older than the result TTL.
#[derive(Debug)]
pub struct JobStore {
    records: Mutex<HashMap<JobId, Entry>>,
    result_ttl: Duration,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_RESULT_TTL)
    }
}

impl JobStore {
    /// Create an empty store keeping finished records for [`DEFAULT_RESULT_TTL`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store keeping finished records for `result_ttl`.
    pub fn with_ttl(result_ttl: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            result_ttl,
        }
    }

    fn lock(&self) -> ReelResult<MutexGuard<'_, HashMap<JobId, Entry>>> {
        self.records
            .lock()
            .map_err(|_| ReelError::Other(anyhow::anyhow!("job store lock poisoned")))
    }

    /// Register a freshly enqueued job.
    pub fn insert_pending(&self, id: JobId, kind: JobKind) -> ReelResult<()> {
        let mut records = self.lock()?;
        self.evict_locked(&mut records);
        if records.contains_key(&id) {
            return Err(ReelError::validation(format!("job '{id}' already exists")));
        }
        records.insert(
            id.clone(),
            Entry {
                record: JobRecord {
                    id,
                    kind,
                    status: JobStatus::Pending,
                    stage: None,
                    result_url: None,
                    error: None,
                },
                finished_at: None,
            },
        );
        Ok(())
    }

    /// Snapshot of a job record. Expired records read as absent.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        let records = self.lock().ok()?;
        let entry = records.get(id)?;
        if entry.expired(self.result_ttl, Instant::now()) {
            return None;
        }
        Some(entry.record.clone())
    }

    /// Drop terminal records older than the result TTL; returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        match self.lock() {
            Ok(mut records) => self.evict_locked(&mut records),
            Err(_) => 0,
        }
    }

    fn evict_locked(&self, records: &mut HashMap<JobId, Entry>) -> usize {
        let now = Instant::now();
        let before = records.len();
        records.retain(|_, e| !e.expired(self.result_ttl, now));
        let evicted = before - records.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired job records");
        }
        evicted
    }

    /// Mark a job as picked up by a worker.
    pub fn mark_running(&self, id: &JobId) -> ReelResult<()> {
        self.update(id, |r| r.status = JobStatus::Running)
    }

    /// Record success with the published URL and a final progress message.
    pub fn mark_succeeded(&self, id: &JobId, url: &str) -> ReelResult<()> {
        self.update(id, |r| {
            r.status = JobStatus::Succeeded;
            r.result_url = Some(url.to_owned());
            r.stage = Some("Done".to_owned());
        })
    }

    /// Record failure with a short error message.
    pub fn mark_failed(&self, id: &JobId, error: &str) -> ReelResult<()> {
        self.update(id, |r| {
            r.status = JobStatus::Failed;
            r.error = Some(error.to_owned());
            r.stage = Some("Failed".to_owned());
        })
    }

    /// Number of jobs that have not reached a terminal state.
    pub fn active_count(&self) -> usize {
        self.lock()
            .map(|r| {
                r.values()
                    .filter(|e| !e.record.status.is_terminal())
                    .count()
            })
            .unwrap_or(0)
    }

    fn update(&self, id: &JobId, f: impl FnOnce(&mut JobRecord)) -> ReelResult<()> {
        let mut records = self.lock()?;
        let entry = records
            .get_mut(id)
            .ok_or_else(|| ReelError::validation(format!("unknown job '{id}'")))?;
        if entry.record.status.is_terminal() {
            tracing::warn!(job = %id, "ignoring update to terminal job");
            return Ok(());
        }
        f(&mut entry.record);
        if entry.record.status.is_terminal() {
            entry.finished_at = Some(Instant::now());
        }
        Ok(())
    }
}

impl ProgressSink for JobStore {
    fn record(&self, job: &JobId, message: &str) -> ReelResult<()> {
        self.update(job, |r| r.stage = Some(message.to_owned()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/store.rs"]
mod tests;
