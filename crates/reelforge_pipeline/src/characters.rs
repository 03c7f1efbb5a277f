//! Character generation for a drama.

use crate::{PipelineContext, extract_items, prompts};
use reelforge_core::{
    CharacterGenerationRequest, Drama, GenerationOptions, NewCharacter, SubjectRef, TaskId,
    TaskType,
};
use reelforge_error::{PipelineError, PipelineErrorKind, ReelforgeResult};
use serde_json::json;
use tracing::{debug, info, instrument};

/// Generates a drama's cast and stores it, reusing characters that already exist by name.
#[derive(Debug, Clone)]
pub struct CharacterGenerator {
    ctx: PipelineContext,
}

#[derive(Debug, Clone)]
struct CharacterJob {
    drama: Drama,
    episode_id: Option<i64>,
    outline: Option<String>,
    count: u32,
    temperature: f32,
    model: Option<String>,
}

impl CharacterGenerator {
    /// Create a generator over shared collaborators.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Validate the request and schedule generation.
    ///
    /// # Errors
    ///
    /// `SubjectNotFound` for an unknown drama or episode, `Validation` for an
    /// out-of-range count or an episode of another drama, `QueueFull` when the
    /// executor is saturated. No task exists after any of these.
    #[instrument(skip(self, request), fields(drama_id = request.drama_id))]
    pub async fn submit(&self, request: CharacterGenerationRequest) -> ReelforgeResult<TaskId> {
        let story = self.ctx.story();
        let drama = story
            .get_drama(request.drama_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("drama", request.drama_id))?;

        if let Some(episode_id) = request.episode_id {
            let episode = story
                .get_episode(episode_id)
                .await?
                .ok_or_else(|| PipelineError::not_found("episode", episode_id))?;
            if episode.drama_id != drama.id {
                return Err(PipelineError::validation(format!(
                    "episode {} does not belong to drama {}",
                    episode_id, drama.id
                ))
                .into());
            }
        }

        let settings = self.ctx.settings();
        let count = request.count.unwrap_or(settings.default_character_count);
        if count == 0 || count > settings.max_character_count {
            return Err(PipelineError::validation(format!(
                "character count must be between 1 and {}",
                settings.max_character_count
            ))
            .into());
        }

        let job = CharacterJob {
            episode_id: request.episode_id,
            outline: request.outline,
            count,
            temperature: request.temperature.unwrap_or(settings.character_temperature),
            model: request.model,
            drama,
        };

        let slot = self.ctx.executor().reserve()?;
        let task = self
            .ctx
            .tasks()
            .create(TaskType::CharacterGeneration, SubjectRef::drama(job.drama.id))
            .await?;
        info!(task_id = %task.id, count, "Character generation scheduled");

        let this = self.clone();
        let task_id = task.id;
        self.ctx.spawn_job(slot, task_id, "Character generation failed", async move {
            this.run(task_id, job).await
        });
        Ok(task_id)
    }

    async fn run(&self, task_id: TaskId, job: CharacterJob) -> ReelforgeResult<serde_json::Value> {
        self.ctx.progress(&task_id, 10, "Generating characters").await;

        let client = self.ctx.text_client(job.model.as_deref()).await?;
        let prompt = prompts::character_prompt(&job.drama, job.outline.as_deref(), job.count);
        let options = GenerationOptions {
            temperature: Some(job.temperature),
            ..GenerationOptions::default()
        };
        let response = client
            .generate(&prompt, Some(prompts::CHARACTER_SYSTEM_PROMPT), &options)
            .await?;

        self.ctx.progress(&task_id, 50, "Parsing characters").await;
        let extracted = extract_items::<NewCharacter>(&response, "characters")?;
        let generated: Vec<NewCharacter> = extracted
            .items
            .into_iter()
            .filter(|c| !c.name.trim().is_empty())
            .map(|mut c| {
                c.name = c.name.trim().to_string();
                c
            })
            .collect();
        debug!(count = generated.len(), shape = ?extracted.shape, "Parsed characters");
        if generated.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::EmptyResult("characters".into())).into());
        }

        self.ctx.progress(&task_id, 70, "Saving characters").await;
        let story = self.ctx.story();
        let characters = story
            .upsert_characters(job.drama.id, job.episode_id, generated)
            .await?;

        info!(count = characters.len(), "Characters generated");
        Ok(json!({
            "characters": characters,
            "count": characters.len(),
        }))
    }
}
