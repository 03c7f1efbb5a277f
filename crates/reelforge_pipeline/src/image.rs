//! Image generation: submission, provider polling, caching and completion.

use crate::PipelineContext;
use reelforge_core::{
    ImageCompletion, ImageGeneration, ImageGenerationRequest, ImageResult, ImageType,
    NewImageGeneration, SubjectKind, SubjectRef, TaskId, TaskType, truncate_url_for_log,
};
use reelforge_error::{PipelineError, PipelineErrorKind, ReelforgeResult};
use reelforge_interface::ImageGenerator;
use reelforge_tasks::{JobSlot, poll_until_complete};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

/// Shortest accepted prompt, in characters.
pub const MIN_PROMPT_CHARS: usize = 5;

/// Longest accepted prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Cache category for generated images.
const CACHE_CATEGORY: &str = "images";

/// Image type implied by a target when the request names none.
fn image_type_for(target: Option<SubjectRef>) -> ImageType {
    match target.map(|t| t.kind) {
        Some(SubjectKind::Scene) => ImageType::Scene,
        Some(SubjectKind::Character) => ImageType::Character,
        _ => ImageType::default(),
    }
}

/// A scheduled image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSubmission {
    /// Record created in `pending` status
    pub generation: ImageGeneration,
    /// Task tracking the generation
    pub task_id: TaskId,
}

/// Drives image records from `pending` to `completed` or `failed`.
///
/// Synchronous providers finish in the first call. Asynchronous providers
/// hand back a job token that is stored on the record and polled until the
/// provider reports an outcome or the poll budget runs out. On success the
/// provider's URL is stored as-is; a local copy is attempted when a media
/// cache is configured, and failing to make one is only logged.
#[derive(Debug, Clone)]
pub struct ImageGenerationService {
    ctx: PipelineContext,
}

impl ImageGenerationService {
    /// Create a service over shared collaborators.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Validate the request, create a pending record and schedule generation.
    ///
    /// # Errors
    ///
    /// `SubjectNotFound` for an unknown drama or target, `Validation` for a
    /// prompt outside 5..=2000 characters or a target that cannot hold an
    /// image, `QueueFull` when saturated.
    #[instrument(skip(self, request), fields(drama_id = request.drama_id))]
    pub async fn submit(&self, request: ImageGenerationRequest) -> ReelforgeResult<ImageSubmission> {
        self.validate(&request).await?;
        let slot = self.ctx.executor().reserve()?;
        self.schedule(slot, request).await
    }

    /// Create the pending record and task for a validated request and start it.
    async fn schedule(
        &self,
        slot: JobSlot,
        request: ImageGenerationRequest,
    ) -> ReelforgeResult<ImageSubmission> {
        let record = NewImageGeneration {
            drama_id: request.drama_id,
            target: request.target,
            image_type: request.image_type.unwrap_or_else(|| image_type_for(request.target)),
            frame_type: request.frame_type,
            provider: request
                .provider
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| self.ctx.settings().default_image_provider.clone()),
            model: request.model,
            prompt: request.prompt,
            options: request.options,
        };
        let generation = self.ctx.images().create_image_generation(record).await?;
        let task = self
            .ctx
            .tasks()
            .create(
                TaskType::ImageGeneration,
                SubjectRef::new(SubjectKind::ImageGeneration, generation.id),
            )
            .await?;
        info!(task_id = %task.id, image_generation_id = generation.id, "Image generation scheduled");

        let this = self.clone();
        let task_id = task.id;
        let scheduled = generation.clone();
        self.ctx.spawn_job(slot, task_id, "Image generation failed", async move {
            this.process(task_id, scheduled).await
        });

        Ok(ImageSubmission { generation, task_id })
    }

    async fn validate(&self, request: &ImageGenerationRequest) -> ReelforgeResult<()> {
        let story = self.ctx.story();
        story
            .get_drama(request.drama_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("drama", request.drama_id))?;

        let chars = request.prompt.trim().chars().count();
        if !(MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS).contains(&chars) {
            return Err(PipelineError::validation(format!(
                "prompt must be {MIN_PROMPT_CHARS} to {MAX_PROMPT_CHARS} characters, got {chars}"
            ))
            .into());
        }

        let Some(target) = request.target else {
            return Ok(());
        };
        let exists = match target.kind {
            SubjectKind::Storyboard => story.get_storyboard(target.id).await?.is_some(),
            SubjectKind::Scene => story.get_scene(target.id).await?.is_some(),
            SubjectKind::Character => story.get_character(target.id).await?.is_some(),
            other => {
                return Err(PipelineError::validation(format!(
                    "a {other} cannot receive an image"
                ))
                .into());
            }
        };
        if !exists {
            return Err(PipelineError::not_found(target.kind.to_string(), target.id).into());
        }
        Ok(())
    }

    async fn process(
        &self,
        task_id: TaskId,
        generation: ImageGeneration,
    ) -> ReelforgeResult<serde_json::Value> {
        let id = generation.id;
        match self.generate(&task_id, &generation).await {
            Ok(record) => Ok(json!({ "image_generation": record })),
            Err(e) => {
                if let Err(store_err) = self
                    .ctx
                    .images()
                    .fail_image_generation(id, &e.user_message())
                    .await
                {
                    error!(image_generation_id = id, error = %store_err, "Failed to record image failure");
                }
                Err(e)
            }
        }
    }

    async fn generate(
        &self,
        task_id: &TaskId,
        generation: &ImageGeneration,
    ) -> ReelforgeResult<ImageGeneration> {
        let images = self.ctx.images();
        self.ctx.progress(task_id, 10, "Submitting image request").await;
        images.mark_image_processing(generation.id, None).await?;

        let client = self
            .ctx
            .resolver()
            .image_generator(generation.model.as_deref())
            .await?;
        let first = client.generate(&generation.prompt, &generation.options).await?;

        let result = if first.completed {
            first
        } else if let Some(error) = first.failure() {
            return Err(PipelineError::new(PipelineErrorKind::ProviderJobFailed(error.to_string())).into());
        } else if let Some(job_id) = first.task_id.clone().filter(|t| !t.is_empty()) {
            images
                .mark_image_processing(generation.id, Some(job_id.clone()))
                .await?;
            self.ctx
                .progress(task_id, 40, "Waiting for provider")
                .await;
            self.poll(client.as_ref(), &job_id).await?
        } else {
            return Err(PipelineError::new(PipelineErrorKind::ProviderJobFailed(
                "provider returned neither an image nor a job token".to_string(),
            ))
            .into());
        };

        self.ctx.progress(task_id, 90, "Storing image").await;
        self.complete(generation.id, result).await
    }

    async fn poll(&self, client: &dyn ImageGenerator, job_id: &str) -> ReelforgeResult<ImageResult> {
        debug!(job_id, "Polling asynchronous image job");
        poll_until_complete(client, job_id, &self.ctx.settings().poll).await
    }

    async fn complete(&self, id: i64, result: ImageResult) -> ReelforgeResult<ImageGeneration> {
        let image_url = result
            .image_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::ProviderJobFailed(
                    "completed without an image URL".to_string(),
                ))
            })?;
        info!(image_generation_id = id, url = %truncate_url_for_log(&image_url), "Image generated");

        let local_path = self.cache(&image_url).await;
        let completion = ImageCompletion {
            image_url,
            local_path,
            width: Some(result.width).filter(|w| *w > 0),
            height: Some(result.height).filter(|h| *h > 0),
        };
        self.ctx
            .images()
            .complete_image_generation(id, completion)
            .await
    }

    /// Best-effort local copy of an http(s) image.
    async fn cache(&self, url: &str) -> Option<String> {
        let cache = self.ctx.cache().as_ref()?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return None;
        }
        match cache.cache(url, CACHE_CATEGORY).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(url = %truncate_url_for_log(url), error = %e, "Failed to cache image, keeping provider URL");
                None
            }
        }
    }

    /// Generate the background image of a scene.
    ///
    /// The prompt is the scene's own prompt, or `"{location}场景，{time}"`.
    #[instrument(skip(self))]
    pub async fn generate_for_scene(&self, scene_id: i64) -> ReelforgeResult<ImageSubmission> {
        let scene = self
            .ctx
            .story()
            .get_scene(scene_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("scene", scene_id))?;

        let prompt = if scene.prompt.trim().is_empty() {
            format!("{}场景，{}", scene.location, scene.time)
        } else {
            scene.prompt.clone()
        };

        self.submit(ImageGenerationRequest {
            drama_id: scene.drama_id,
            target: Some(SubjectRef::scene(scene.id)),
            image_type: Some(ImageType::Scene),
            prompt,
            ..ImageGenerationRequest::default()
        })
        .await
    }

    /// Generate one image per shot of an episode that has an image prompt.
    ///
    /// Shots without an image prompt are skipped. Queue slots for the whole
    /// batch are reserved first, so `QueueFull` schedules nothing.
    #[instrument(skip(self))]
    pub async fn generate_for_episode(&self, episode_id: i64) -> ReelforgeResult<Vec<ImageSubmission>> {
        let story = self.ctx.story();
        let episode = story
            .get_episode(episode_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("episode", episode_id))?;

        let mut requests = Vec::new();
        for shot in story.list_storyboards(episode.id).await? {
            let Some(prompt) = shot
                .shot
                .image_prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
            else {
                debug!(storyboard_id = shot.id, "Shot has no image prompt, skipping");
                continue;
            };
            let request = ImageGenerationRequest {
                drama_id: episode.drama_id,
                target: Some(SubjectRef::storyboard(shot.id)),
                image_type: Some(ImageType::Storyboard),
                prompt: prompt.to_string(),
                ..ImageGenerationRequest::default()
            };
            self.validate(&request).await?;
            requests.push(request);
        }

        let executor = self.ctx.executor();
        let slots = requests
            .iter()
            .map(|_| executor.reserve())
            .collect::<Result<Vec<JobSlot>, _>>()?;

        let mut submissions = Vec::with_capacity(requests.len());
        for (slot, request) in slots.into_iter().zip(requests) {
            submissions.push(self.schedule(slot, request).await?);
        }

        info!(count = submissions.len(), "Episode image generation scheduled");
        Ok(submissions)
    }

    /// Image records of a drama, newest first.
    pub async fn list(&self, drama_id: i64) -> ReelforgeResult<Vec<ImageGeneration>> {
        self.ctx.images().list_image_generations(drama_id).await
    }

    /// Load an image record.
    pub async fn get(&self, id: i64) -> ReelforgeResult<ImageGeneration> {
        self.ctx
            .images()
            .get_image_generation(id)
            .await?
            .ok_or_else(|| PipelineError::not_found("image_generation", id).into())
    }

    /// Delete an image record.
    pub async fn delete(&self, id: i64) -> ReelforgeResult<()> {
        if self.ctx.images().delete_image_generation(id).await? {
            Ok(())
        } else {
            Err(PipelineError::not_found("image_generation", id).into())
        }
    }
}
