//! Storyboard decomposition of an episode script.

use crate::{GeneratedShot, PipelineContext, VideoStyle, extract_items, prompts};
use reelforge_core::{
    Episode, GenerationOptions, ShotSpec, StoryboardGenerationRequest, SubjectRef, TaskId,
    TaskType,
};
use reelforge_error::{PipelineError, ReelforgeResult};
use serde_json::json;
use tracing::{info, instrument, warn};

/// Breaks an episode into shots and replaces its storyboard.
///
/// There is no fallback: a failed model call or an unparsable answer fails
/// the task and leaves the existing shots untouched. Two regenerations of the
/// same episode racing each other are not serialized; whichever commits last
/// wins.
#[derive(Debug, Clone)]
pub struct StoryboardGenerator {
    ctx: PipelineContext,
}

/// Runtime in whole minutes, rounding any partial minute up.
///
/// # Examples
///
/// ```
/// use reelforge_pipeline::duration_minutes;
///
/// assert_eq!(duration_minutes(0), 0);
/// assert_eq!(duration_minutes(60), 1);
/// assert_eq!(duration_minutes(61), 2);
/// assert_eq!(duration_minutes(i64::MAX), i32::MAX);
/// ```
pub fn duration_minutes(total_seconds: i64) -> i32 {
    let minutes = total_seconds.max(0).saturating_add(59) / 60;
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

impl StoryboardGenerator {
    /// Create a generator over shared collaborators.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Validate the episode and schedule decomposition.
    ///
    /// # Errors
    ///
    /// `SubjectNotFound` for an unknown episode, `Validation` when it has
    /// neither script nor description, `QueueFull` when saturated.
    #[instrument(skip(self, request), fields(episode_id = request.episode_id))]
    pub async fn submit(&self, request: StoryboardGenerationRequest) -> ReelforgeResult<TaskId> {
        let episode = self
            .ctx
            .story()
            .get_episode(request.episode_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("episode", request.episode_id))?;
        let script = episode
            .source_text()
            .map(str::to_string)
            .ok_or_else(|| PipelineError::validation("episode has no script or description"))?;

        let slot = self.ctx.executor().reserve()?;
        let task = self
            .ctx
            .tasks()
            .create(TaskType::StoryboardGeneration, SubjectRef::episode(episode.id))
            .await?;
        info!(task_id = %task.id, "Storyboard generation scheduled");

        let this = self.clone();
        let task_id = task.id;
        let model = request.model;
        self.ctx.spawn_job(slot, task_id, "Storyboard generation failed", async move {
            this.run(task_id, episode, script, model).await
        });
        Ok(task_id)
    }

    async fn run(
        &self,
        task_id: TaskId,
        episode: Episode,
        script: String,
        model: Option<String>,
    ) -> ReelforgeResult<serde_json::Value> {
        self.ctx.progress(&task_id, 10, "Generating storyboard").await;

        let story = self.ctx.story();
        let characters = story.list_characters(episode.drama_id).await?;
        let scenes = story.list_scenes(episode.id).await?;
        let prompt = prompts::storyboard_prompt(&script, &characters, &scenes);

        let settings = self.ctx.settings();
        let client = self.ctx.text_client(model.as_deref()).await?;
        let options = GenerationOptions {
            max_tokens: Some(settings.storyboard_max_tokens),
            ..GenerationOptions::default()
        };
        let response = client
            .generate(&prompt, Some(prompts::STORYBOARD_SYSTEM_PROMPT), &options)
            .await?;

        self.ctx
            .progress(&task_id, 50, "Storyboard generated, parsing result")
            .await;
        let extracted = extract_items::<GeneratedShot>(&response, "storyboards")?;
        let video = VideoStyle {
            style: settings.video_style.as_deref(),
            ratio: settings.video_ratio.as_deref(),
        };
        let shots: Vec<ShotSpec> = extracted
            .items
            .into_iter()
            .enumerate()
            .map(|(index, shot)| shot.into_spec(index, video))
            .collect();
        let total_duration: i64 = shots.iter().map(|s| i64::from(s.duration)).sum();
        info!(shots = shots.len(), total_duration, "Parsed storyboard");

        self.ctx.progress(&task_id, 70, "Saving storyboard").await;
        let saved = story.replace_storyboards(episode.id, shots).await?;

        self.ctx.progress(&task_id, 90, "Updating episode duration").await;
        let minutes = duration_minutes(total_duration);
        if let Err(e) = story.set_episode_duration(episode.id, minutes).await {
            warn!(episode_id = episode.id, error = %e, "Failed to update episode duration");
        }

        Ok(json!({
            "storyboards": saved,
            "total": saved.len(),
            "total_duration": total_duration,
            "duration_minutes": minutes,
        }))
    }
}
