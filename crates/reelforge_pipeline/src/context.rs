//! Collaborators shared by every orchestrator, and the background job wrapper.

use crate::PipelineSettings;
use reelforge_core::{TaskId, TaskStatus, truncate_chars};
use reelforge_error::ReelforgeResult;
use reelforge_interface::{
    ImageGenerationRepository, MediaCache, ProviderResolver, StoryRepository, TextGenerator,
};
use reelforge_tasks::{JobExecutor, JobSlot, TaskRegistry};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info_span, warn};

/// Longest user-facing failure message stored on a task.
const FAILURE_MESSAGE_LIMIT: usize = 300;

/// Injected dependencies of the orchestrators.
///
/// Cloning is cheap; every collaborator is shared.
#[derive(Clone, derive_getters::Getters)]
pub struct PipelineContext {
    resolver: Arc<dyn ProviderResolver>,
    tasks: TaskRegistry,
    story: Arc<dyn StoryRepository>,
    images: Arc<dyn ImageGenerationRepository>,
    executor: JobExecutor,
    cache: Option<Arc<dyn MediaCache>>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("executor", &self.executor)
            .field("cache", &self.cache.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    /// Wire the required collaborators with a default executor and settings.
    pub fn new(
        resolver: Arc<dyn ProviderResolver>,
        tasks: TaskRegistry,
        story: Arc<dyn StoryRepository>,
        images: Arc<dyn ImageGenerationRepository>,
    ) -> Self {
        Self {
            resolver,
            tasks,
            story,
            images,
            executor: JobExecutor::default(),
            cache: None,
            settings: PipelineSettings::default(),
        }
    }

    /// Use `executor` for background jobs.
    pub fn with_executor(mut self, executor: JobExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Cache completed images locally.
    pub fn with_cache(mut self, cache: Arc<dyn MediaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the generation settings.
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Text client for `model`, falling back to the default text provider.
    pub(crate) async fn text_client(&self, model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>> {
        self.resolver.text_generator(model).await
    }

    /// Record progress on a running task. Failures are logged, never raised.
    pub(crate) async fn progress(&self, task_id: &TaskId, progress: u8, message: &str) {
        if let Err(e) = self
            .tasks
            .update_status(task_id, TaskStatus::Processing, progress, message)
            .await
        {
            warn!(task_id = %task_id, error = %e, "Failed to record task progress");
        }
    }

    /// Run `job` on a reserved slot and settle its task.
    ///
    /// The task is moved to `processing` before the job starts. An `Ok`
    /// result completes the task; an error fails it with
    /// `"{failure_message}: {cause}"` and the full error as detail. The job
    /// runs as its own tokio task, so a panic inside it fails the task as an
    /// internal error instead of leaving it in `processing`.
    pub(crate) fn spawn_job<F>(
        &self,
        slot: JobSlot,
        task_id: TaskId,
        failure_message: &'static str,
        job: F,
    ) -> JoinHandle<()>
    where
        F: Future<Output = ReelforgeResult<serde_json::Value>> + Send + 'static,
    {
        let tasks = self.tasks.clone();
        let span = info_span!("generation_job", task_id = %task_id);
        slot.spawn(
            async move {
                if let Err(e) = tasks
                    .update_status(&task_id, TaskStatus::Processing, 0, "Started")
                    .await
                {
                    error!(error = %e, "Failed to start task");
                    return;
                }

                let outcome = tokio::spawn(job.in_current_span()).await;
                let settled = match outcome {
                    Ok(Ok(result)) => tasks.complete(&task_id, result).await,
                    Ok(Err(e)) => {
                        let message = truncate_chars(
                            &format!("{failure_message}: {}", e.user_message()),
                            FAILURE_MESSAGE_LIMIT,
                        );
                        tasks.fail(&task_id, message, &e.to_string()).await
                    }
                    Err(join_error) => {
                        error!(error = %join_error, "Generation job aborted");
                        tasks
                            .fail(
                                &task_id,
                                format!("{failure_message}: internal error"),
                                &join_error.to_string(),
                            )
                            .await
                    }
                };
                if let Err(e) = settled {
                    error!(error = %e, "Failed to settle task");
                }
            }
            .instrument(span),
        )
    }
}
