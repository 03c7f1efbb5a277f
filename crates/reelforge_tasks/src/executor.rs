//! Bounded background job execution.

use reelforge_error::{PipelineError, PipelineErrorKind};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Concurrency limits for background jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Jobs running at the same time
    pub max_concurrent: usize,
    /// Jobs running or waiting; submissions beyond this are rejected
    pub queue_depth: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            queue_depth: 64,
        }
    }
}

/// Runs detached jobs on the tokio runtime with a concurrency ceiling.
///
/// Capacity is reserved with [`JobExecutor::reserve`] before any side effect
/// of a submission, so a full queue rejects the submission cleanly.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    config: ExecutorConfig,
}

impl Default for JobExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl JobExecutor {
    /// Create an executor; zero limits are raised to one.
    pub fn new(config: ExecutorConfig) -> Self {
        let config = ExecutorConfig {
            max_concurrent: config.max_concurrent.max(1),
            queue_depth: config.queue_depth.max(1),
        };
        Self {
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Jobs currently reserved, queued or running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Effective limits.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Claim a queue slot, or fail with `QueueFull`.
    pub fn reserve(&self) -> Result<JobSlot, PipelineError> {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.in_flight));
        if previous >= self.config.queue_depth {
            warn!(depth = self.config.queue_depth, "Job queue full, rejecting submission");
            return Err(PipelineError::new(PipelineErrorKind::QueueFull {
                depth: self.config.queue_depth,
            }));
        }
        Ok(JobSlot {
            permits: Arc::clone(&self.permits),
            in_flight: guard,
        })
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A reserved place in the executor queue. Dropping it unused frees the slot.
pub struct JobSlot {
    permits: Arc<Semaphore>,
    in_flight: InFlight,
}

impl std::fmt::Debug for JobSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSlot").finish_non_exhaustive()
    }
}

impl JobSlot {
    /// Run `job` once a concurrency permit is available.
    pub fn spawn<F>(self, job: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let JobSlot { permits, in_flight } = self;
        tokio::spawn(async move {
            let _in_flight = in_flight;
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Executor closed before job could start");
                    return;
                }
            };
            debug!("Job started");
            job.await;
        })
    }
}
