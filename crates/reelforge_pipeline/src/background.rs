//! Background scene extraction for an episode.

use crate::{PipelineContext, extract_items, fallback, prompts};
use reelforge_core::{
    BackgroundExtractionRequest, BackgroundSource, Episode, GenerationOptions, NewScene,
    Storyboard, SubjectRef, TaskId, TaskType,
};
use reelforge_error::{PipelineError, PipelineErrorKind, ReelforgeResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

/// One background in the model's answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct ExtractedBackground {
    location: String,
    time: String,
    atmosphere: String,
    prompt: String,
    /// Script scene numbers, or shot numbers when extracting from shots
    scene_numbers: Vec<i32>,
    #[serde(alias = "storyboard_numbers", alias = "shot_numbers")]
    storyboard_number: ShotNumbers,
}

/// A single shot number or a list of them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
enum ShotNumbers {
    #[default]
    None,
    One(i32),
    Many(Vec<i32>),
}

impl ExtractedBackground {
    fn into_scene(self, source: BackgroundSource) -> Option<NewScene> {
        let location = self.location.trim().to_string();
        if location.is_empty() {
            return None;
        }
        let time = self.time.trim().to_string();
        let prompt = if self.prompt.trim().is_empty() {
            [location.as_str(), time.as_str(), self.atmosphere.trim()]
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            self.prompt.trim().to_string()
        };

        let shot_numbers = match source {
            BackgroundSource::Script => Vec::new(),
            BackgroundSource::Storyboards => {
                let mut numbers = self.scene_numbers;
                match self.storyboard_number {
                    ShotNumbers::None => {}
                    ShotNumbers::One(n) => numbers.push(n),
                    ShotNumbers::Many(ns) => numbers.extend(ns),
                }
                numbers.sort_unstable();
                numbers.dedup();
                numbers
            }
        };

        Some(NewScene {
            location,
            time,
            prompt,
            storyboard_count: (shot_numbers.len() as i32).max(1),
            shot_numbers,
        })
    }
}

/// Input to extract from, loaded at submission.
#[derive(Debug, Clone)]
enum Material {
    Script(String),
    Shots(Vec<Storyboard>),
}

/// Extracts an episode's distinct backgrounds and replaces its scenes.
///
/// From script text the model is the only path. From existing shots a
/// failed or empty model answer falls back to grouping shots by exact
/// location and time.
#[derive(Debug, Clone)]
pub struct BackgroundExtractor {
    ctx: PipelineContext,
}

impl BackgroundExtractor {
    /// Create an extractor over shared collaborators.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Validate the episode and its source material, then schedule extraction.
    ///
    /// # Errors
    ///
    /// `SubjectNotFound` for an unknown episode; `Validation` when the chosen
    /// source is empty; `QueueFull` when saturated.
    #[instrument(skip(self, request), fields(episode_id = request.episode_id, source = %request.source))]
    pub async fn submit(&self, request: BackgroundExtractionRequest) -> ReelforgeResult<TaskId> {
        let story = self.ctx.story();
        let episode = story
            .get_episode(request.episode_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("episode", request.episode_id))?;

        let material = match request.source {
            BackgroundSource::Script => {
                let script = episode
                    .script_content
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| PipelineError::validation("episode has no script content"))?;
                Material::Script(script.to_string())
            }
            BackgroundSource::Storyboards => {
                let shots = story.list_storyboards(episode.id).await?;
                if shots.is_empty() {
                    return Err(PipelineError::validation("episode has no storyboard shots").into());
                }
                Material::Shots(shots)
            }
        };

        let slot = self.ctx.executor().reserve()?;
        let task = self
            .ctx
            .tasks()
            .create(TaskType::BackgroundExtraction, SubjectRef::episode(episode.id))
            .await?;
        info!(task_id = %task.id, "Background extraction scheduled");

        let this = self.clone();
        let task_id = task.id;
        self.ctx.spawn_job(slot, task_id, "Background extraction failed", async move {
            this.run(task_id, episode, material, request).await
        });
        Ok(task_id)
    }

    async fn run(
        &self,
        task_id: TaskId,
        episode: Episode,
        material: Material,
        request: BackgroundExtractionRequest,
    ) -> ReelforgeResult<serde_json::Value> {
        self.ctx.progress(&task_id, 10, "Extracting backgrounds").await;

        let scenes = match material {
            Material::Script(script) => {
                let prompt = prompts::background_script_prompt(&script);
                self.extract(&request, &prompt, BackgroundSource::Script)
                    .await?
            }
            Material::Shots(shots) => {
                let prompt = prompts::background_storyboard_prompt(&shots);
                match self
                    .extract(&request, &prompt, BackgroundSource::Storyboards)
                    .await
                {
                    Ok(scenes) if !scenes.is_empty() => scenes,
                    Ok(_) => {
                        warn!("Model found no backgrounds, grouping shots instead");
                        fallback::dedupe_backgrounds(&shots)
                    }
                    Err(e) => {
                        warn!(error = %e, "Background extraction failed, grouping shots instead");
                        fallback::dedupe_backgrounds(&shots)
                    }
                }
            }
        };
        if scenes.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::EmptyResult("scenes".into())).into());
        }

        self.ctx.progress(&task_id, 70, "Saving scenes").await;
        let saved = self.ctx.story().replace_scenes(episode.id, scenes).await?;
        info!(count = saved.len(), "Backgrounds extracted");

        Ok(json!({
            "scenes": saved,
            "count": saved.len(),
            "episode_id": episode.id,
            "drama_id": episode.drama_id,
        }))
    }

    async fn extract(
        &self,
        request: &BackgroundExtractionRequest,
        prompt: &str,
        source: BackgroundSource,
    ) -> ReelforgeResult<Vec<NewScene>> {
        let client = self.ctx.text_client(request.model.as_deref()).await?;
        let system = prompts::background_system_prompt(request.style.as_deref());
        let options = GenerationOptions {
            temperature: Some(self.ctx.settings().background_temperature),
            ..GenerationOptions::default()
        };
        let response = client.generate(prompt, Some(&system), &options).await?;
        let extracted = extract_items::<ExtractedBackground>(&response, "backgrounds")?;
        Ok(extracted
            .items
            .into_iter()
            .filter_map(|b| b.into_scene(source))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shot_numbers_accept_single_or_list() {
        let one: ExtractedBackground =
            serde_json::from_str(r#"{"location": "Pier", "time": "Dusk", "storyboard_number": 4}"#)
                .unwrap();
        let scene = one.into_scene(BackgroundSource::Storyboards).unwrap();
        assert_eq!(scene.shot_numbers, vec![4]);
        assert_eq!(scene.prompt, "Pier, Dusk");

        let many: ExtractedBackground = serde_json::from_str(
            r#"{"location": "Pier", "time": "Dusk", "prompt": "p", "scene_numbers": [3, 1], "storyboard_numbers": [1, 2]}"#,
        )
        .unwrap();
        let scene = many.into_scene(BackgroundSource::Storyboards).unwrap();
        assert_eq!(scene.shot_numbers, vec![1, 2, 3]);
        assert_eq!(scene.storyboard_count, 3);
    }

    #[test]
    fn script_backgrounds_link_no_shots() {
        let bg: ExtractedBackground =
            serde_json::from_str(r#"{"location": "Pier", "time": "Dusk", "scene_numbers": [1, 2]}"#)
                .unwrap();
        let scene = bg.into_scene(BackgroundSource::Script).unwrap();
        assert!(scene.shot_numbers.is_empty());
        assert_eq!(scene.storyboard_count, 1);
        assert!(ExtractedBackground::default().into_scene(BackgroundSource::Script).is_none());
    }
}
