//! Task registry service.

use reelforge_core::{SubjectRef, Task, TaskId, TaskStatus, TaskType};
use reelforge_error::{ReelforgeResult, TaskError, TaskErrorKind};
use reelforge_interface::TaskRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Creates tasks and moves them through `pending -> processing -> completed | failed`.
///
/// Updates to a task that is already terminal are ignored, so late progress
/// reports from a worker never resurrect a finished task.
#[derive(Clone)]
pub struct TaskRegistry {
    repository: Arc<dyn TaskRepository>,
}

impl TaskRegistry {
    /// Build a registry over a task repository.
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Create and persist a pending task.
    #[instrument(skip(self))]
    pub async fn create(&self, task_type: TaskType, subject: SubjectRef) -> ReelforgeResult<Task> {
        let task = Task::new(task_type, subject);
        self.repository.insert_task(&task).await?;
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Load a task or fail with `NotFound`.
    pub async fn get(&self, id: &TaskId) -> ReelforgeResult<Task> {
        self.repository
            .get_task(id)
            .await?
            .ok_or_else(|| TaskError::new(TaskErrorKind::NotFound(id.to_string())).into())
    }

    /// Tasks about one subject, newest first.
    pub async fn list_for(&self, subject: &SubjectRef) -> ReelforgeResult<Vec<Task>> {
        self.repository.list_tasks(subject).await
    }

    /// Record progress. A terminal task is returned unchanged.
    #[instrument(skip(self, message))]
    pub async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        progress: u8,
        message: impl Into<String>,
    ) -> ReelforgeResult<Task> {
        let mut task = self.get(id).await?;
        if task.status.is_terminal() {
            debug!(status = %task.status, "Ignoring update to finished task");
            return Ok(task);
        }
        task.advance(status, progress, message)?;
        self.repository.update_task(&task).await?;
        Ok(task)
    }

    /// Mark a task completed with its result.
    #[instrument(skip(self, result))]
    pub async fn complete(&self, id: &TaskId, result: serde_json::Value) -> ReelforgeResult<Task> {
        let mut task = self.get(id).await?;
        task.complete(result)?;
        self.repository.update_task(&task).await?;
        info!("Task completed");
        Ok(task)
    }

    /// Mark a task failed. `message` is user facing, `detail` diagnostic.
    #[instrument(skip(self, message, detail))]
    pub async fn fail(
        &self,
        id: &TaskId,
        message: impl Into<String>,
        detail: &str,
    ) -> ReelforgeResult<Task> {
        let mut task = self.get(id).await?;
        task.fail(message, detail)?;
        self.repository.update_task(&task).await?;
        warn!(error = %task.error.as_deref().unwrap_or_default(), "Task failed");
        Ok(task)
    }

    /// Re-read a task every `interval` until it is terminal or `timeout` passes.
    ///
    /// Returns the last observed state, which is non-terminal on timeout.
    #[instrument(skip(self))]
    pub async fn wait_until_terminal(
        &self,
        id: &TaskId,
        interval: Duration,
        timeout: Duration,
    ) -> ReelforgeResult<Task> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let task = self.get(id).await?;
            if task.status.is_terminal() || tokio::time::Instant::now() >= deadline {
                return Ok(task);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
