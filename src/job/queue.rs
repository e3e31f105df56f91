//! Fixed-size worker pool pulling jobs from one FIFO queue.
//!
//! Each job runs start to finish on a single worker thread. Workers share nothing but the
//! runner (immutable configuration and capabilities) and the status store.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::JobOptions;
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::{JobContent, JobId, JobOutput};
use crate::job::store::JobStore;

/// Executes one job synchronously.
pub trait JobRunner: Send + Sync {
    /// Run the job to completion.
    fn run(&self, id: &JobId, content: &JobContent, options: &JobOptions) -> ReelResult<JobOutput>;
}

struct QueuedJob {
    id: JobId,
    content: JobContent,
    options: JobOptions,
}

/// Worker threads plus the sending half of their queue.
pub struct WorkerPool {
    tx: Option<Sender<QueuedJob>>,
    workers: Vec<JoinHandle<()>>,
    store: Arc<JobStore>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("open", &self.tx.is_some())
            .finish()
    }
}

impl WorkerPool {
    /// Spawn `workers` threads (at least one) executing jobs with `runner`.
    pub fn start(
        workers: usize,
        runner: Arc<dyn JobRunner>,
        store: Arc<JobStore>,
    ) -> ReelResult<Self> {
        let (tx, rx) = mpsc::channel::<QueuedJob>();
        let rx = Arc::new(Mutex::new(rx));
        let mut handles = Vec::with_capacity(workers.max(1));
        for i in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let runner = Arc::clone(&runner);
            let store = Arc::clone(&store);
            let handle = std::thread::Builder::new()
                .name(format!("reelsmith-worker-{i}"))
                .spawn(move || worker_loop(&rx, runner.as_ref(), &store))
                .map_err(|e| ReelError::Other(anyhow::anyhow!("failed to spawn worker: {e}")))?;
            handles.push(handle);
        }
        tracing::info!(workers = handles.len(), "worker pool started");
        Ok(Self {
            tx: Some(tx),
            workers: handles,
            store,
        })
    }

    /// Validate `content`, record it as pending and enqueue it.
    pub fn submit(&self, content: JobContent, options: JobOptions) -> ReelResult<JobId> {
        content.validate()?;
        options.validate()?;
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ReelError::validation("worker pool is shut down"))?;
        let id = JobId::generate();
        self.store.insert_pending(id.clone(), content.kind())?;
        tx.send(QueuedJob {
            id: id.clone(),
            content,
            options,
        })
        .map_err(|_| ReelError::Other(anyhow::anyhow!("job queue is closed")))?;
        tracing::debug!(job = %id, "job enqueued");
        Ok(id)
    }

    /// Status store shared with the workers.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Close the queue, let workers drain it and join them.
    pub fn shutdown(mut self) {
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        drop(self.tx.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked outside a job");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

fn worker_loop(rx: &Mutex<Receiver<QueuedJob>>, runner: &dyn JobRunner, store: &JobStore) {
    loop {
        let next = match rx.lock() {
            Ok(guard) => guard.recv(),
            Err(poisoned) => poisoned.into_inner().recv(),
        };
        let Ok(job) = next else {
            break;
        };

        if let Err(e) = store.mark_running(&job.id) {
            tracing::warn!(job = %job.id, error = %e, "status update failed");
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            runner.run(&job.id, &job.content, &job.options)
        }));
        let update = match outcome {
            Ok(Ok(out)) => store.mark_succeeded(&job.id, &out.video_url),
            Ok(Err(e)) => {
                tracing::warn!(job = %job.id, class = ?e.class(), error = %e, "job failed");
                store.mark_failed(&job.id, &e.to_string())
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                tracing::error!(job = %job.id, panic = %msg, "job panicked");
                store.mark_failed(&job.id, &format!("internal error: {msg}"))
            }
        };
        if let Err(e) = update {
            tracing::warn!(job = %job.id, error = %e, "status update failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/queue.rs"]
mod tests;
