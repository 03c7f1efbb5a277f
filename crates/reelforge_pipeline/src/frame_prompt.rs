//! Frame prompt generation for a single shot.
//!
//! Single-frame types (`first`, `key`, `last`) make one model call. A
//! `panel` board chains three or four single-frame calls and an `action`
//! sequence chains five; their prompts are stored as one combined record.
//! Every single-frame call falls back to a field-concatenation prompt when
//! the model fails or answers with something unparsable.

use crate::{PipelineContext, extract_object, fallback, prompts};
use reelforge_core::{
    Character, FramePromptRequest, FrameType, GenerationOptions, NewFramePrompt, Scene,
    Storyboard, SubjectRef, TaskId, TaskType,
};
use reelforge_error::{PipelineError, ReelforgeResult};
use reelforge_interface::TextGenerator;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

/// Separator between frame prompts in a combined record.
pub const FRAME_SEPARATOR: &str = "\n---\n";

const PANEL_DESCRIPTION: &str = "分镜板组合提示词";
const ACTION_DESCRIPTION: &str = "动作序列组合提示词";

/// One generated frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleFrame {
    /// Image prompt
    pub prompt: String,
    /// What the frame shows
    #[serde(default)]
    pub description: String,
}

/// Ordered frames of a board or sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiFrame {
    /// Layout hint such as `horizontal_3`
    pub layout: String,
    /// Frames in narrative order
    pub frames: Vec<SingleFrame>,
}

impl MultiFrame {
    /// Frame prompts joined with [`FRAME_SEPARATOR`].
    pub fn combined_prompt(&self) -> String {
        self.frames
            .iter()
            .map(|f| f.prompt.as_str())
            .collect::<Vec<_>>()
            .join(FRAME_SEPARATOR)
    }
}

/// Generated frames of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePromptResponse {
    /// Requested frame type
    pub frame_type: FrameType,
    /// Present for `first`, `key` and `last`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_frame: Option<SingleFrame>,
    /// Present for `panel` and `action`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_frame: Option<MultiFrame>,
}

/// Frame order of a panel board, with the label each panel is given.
///
/// Only 3 and 4 panels are valid.
pub fn panel_sequence(count: u32) -> Option<Vec<(FrameType, &'static str)>> {
    match count {
        3 => Some(vec![
            (FrameType::First, "第1格：初始状态"),
            (FrameType::Key, "第2格：动作高潮"),
            (FrameType::Last, "第3格：最终状态"),
        ]),
        4 => Some(vec![
            (FrameType::First, "第1格：初始状态"),
            (FrameType::Key, "第2格：动作发展"),
            (FrameType::Key, "第3格：动作高潮"),
            (FrameType::Last, "第4格：最终状态"),
        ]),
        _ => None,
    }
}

/// Frame order of a five-frame action sequence.
pub const ACTION_SEQUENCE: [FrameType; 5] = [
    FrameType::First,
    FrameType::Key,
    FrameType::Key,
    FrameType::Key,
    FrameType::Last,
];

/// A shot with the records it refers to.
#[derive(Debug, Clone)]
struct ShotContext {
    shot: Storyboard,
    scene: Option<Scene>,
    characters: Vec<Character>,
}

/// Generates and stores frame prompts.
#[derive(Debug, Clone)]
pub struct FramePromptGenerator {
    ctx: PipelineContext,
}

impl FramePromptGenerator {
    /// Create a generator over shared collaborators.
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Validate the request and schedule generation.
    ///
    /// # Errors
    ///
    /// `SubjectNotFound` for an unknown shot, `Validation` for a panel count
    /// other than 3 or 4, `QueueFull` when saturated.
    #[instrument(skip(self, request), fields(storyboard_id = request.storyboard_id, frame_type = %request.frame_type))]
    pub async fn submit(&self, request: FramePromptRequest) -> ReelforgeResult<TaskId> {
        let shot = self
            .ctx
            .story()
            .get_storyboard(request.storyboard_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("storyboard", request.storyboard_id))?;

        let panel_count = request.panel_count.unwrap_or(3);
        if request.frame_type == FrameType::Panel && panel_sequence(panel_count).is_none() {
            return Err(PipelineError::validation(format!(
                "panel count must be 3 or 4, got {panel_count}"
            ))
            .into());
        }

        let slot = self.ctx.executor().reserve()?;
        let task = self
            .ctx
            .tasks()
            .create(TaskType::FramePromptGeneration, SubjectRef::storyboard(shot.id))
            .await?;
        info!(task_id = %task.id, "Frame prompt generation scheduled");

        let this = self.clone();
        let task_id = task.id;
        self.ctx.spawn_job(slot, task_id, "Frame prompt generation failed", async move {
            this.run(task_id, shot, request.frame_type, panel_count, request.model)
                .await
        });
        Ok(task_id)
    }

    async fn run(
        &self,
        task_id: TaskId,
        shot: Storyboard,
        frame_type: FrameType,
        panel_count: u32,
        model: Option<String>,
    ) -> ReelforgeResult<serde_json::Value> {
        self.ctx.progress(&task_id, 10, "Generating frame prompt").await;
        let context = self.load_context(shot).await?;
        let storyboard_id = context.shot.id;

        // A missing client degrades every frame to the fallback prompt.
        let client = match self.ctx.text_client(model.as_deref()).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "No text provider, using fallback frame prompts");
                None
            }
        };
        let client = client.as_deref();

        let (response, record) = match frame_type {
            FrameType::First | FrameType::Key | FrameType::Last => {
                let frame = self.single_frame(client, &context, frame_type).await;
                let record = NewFramePrompt {
                    storyboard_id,
                    frame_type,
                    prompt: frame.prompt.clone(),
                    description: Some(frame.description.clone()).filter(|d| !d.is_empty()),
                    layout: None,
                };
                let response = FramePromptResponse {
                    frame_type,
                    single_frame: Some(frame),
                    multi_frame: None,
                };
                (response, record)
            }
            FrameType::Panel | FrameType::Action => {
                let (sequence, description): (Vec<(FrameType, Option<&str>)>, &str) =
                    if frame_type == FrameType::Panel {
                        let panels = panel_sequence(panel_count).ok_or_else(|| {
                            PipelineError::validation(format!(
                                "panel count must be 3 or 4, got {panel_count}"
                            ))
                        })?;
                        (
                            panels.into_iter().map(|(f, label)| (f, Some(label))).collect(),
                            PANEL_DESCRIPTION,
                        )
                    } else {
                        (
                            ACTION_SEQUENCE.iter().map(|f| (*f, None)).collect(),
                            ACTION_DESCRIPTION,
                        )
                    };

                let total = sequence.len();
                let mut frames = Vec::with_capacity(total);
                for (index, (single_type, label)) in sequence.into_iter().enumerate() {
                    let progress = 10 + (80 * (index + 1) / total) as u8;
                    self.ctx
                        .progress(&task_id, progress, &format!("Generating frame {}", index + 1))
                        .await;
                    let mut frame = self.single_frame(client, &context, single_type).await;
                    if let Some(label) = label {
                        frame.description = label.to_string();
                    }
                    frames.push(frame);
                }

                let multi = MultiFrame {
                    layout: format!("horizontal_{}", frames.len()),
                    frames,
                };
                let record = NewFramePrompt {
                    storyboard_id,
                    frame_type,
                    prompt: multi.combined_prompt(),
                    description: Some(description.to_string()),
                    layout: Some(multi.layout.clone()),
                };
                let response = FramePromptResponse {
                    frame_type,
                    single_frame: None,
                    multi_frame: Some(multi),
                };
                (response, record)
            }
        };

        self.ctx.story().save_frame_prompt(record).await?;
        info!(storyboard_id, frame_type = %frame_type, "Frame prompt saved");

        Ok(json!({
            "response": response,
            "storyboard_id": storyboard_id,
            "frame_type": frame_type,
        }))
    }

    async fn load_context(&self, shot: Storyboard) -> ReelforgeResult<ShotContext> {
        let story = self.ctx.story();

        let scene = match shot.shot.scene_id {
            Some(scene_id) => {
                let scene = story.get_scene(scene_id).await?;
                if scene.is_none() {
                    warn!(scene_id, "Shot references a missing scene");
                }
                scene
            }
            None => None,
        };

        let characters = if shot.shot.character_ids.is_empty() {
            Vec::new()
        } else {
            let episode = story
                .get_episode(shot.episode_id)
                .await?
                .ok_or_else(|| PipelineError::not_found("episode", shot.episode_id))?;
            story
                .list_characters(episode.drama_id)
                .await?
                .into_iter()
                .filter(|c| shot.shot.character_ids.contains(&c.id))
                .collect()
        };

        Ok(ShotContext {
            shot,
            scene,
            characters,
        })
    }

    /// One frame from the model, or the fallback composition.
    async fn single_frame(
        &self,
        client: Option<&dyn TextGenerator>,
        context: &ShotContext,
        frame_type: FrameType,
    ) -> SingleFrame {
        let fallback = || SingleFrame {
            prompt: fallback::fallback_frame_prompt(
                &context.shot,
                context.scene.as_ref(),
                &context.characters,
                frame_type,
            ),
            description: fallback::frame_description(frame_type).to_string(),
        };

        let Some(client) = client else {
            return fallback();
        };

        let shot_context =
            prompts::shot_context(&context.shot, context.scene.as_ref(), &context.characters);
        let response = match client
            .generate(
                &prompts::frame_prompt(&shot_context),
                Some(prompts::frame_system_prompt(frame_type)),
                &GenerationOptions::default(),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(frame_type = %frame_type, error = %e, "Frame prompt call failed, using fallback");
                return fallback();
            }
        };

        match extract_object::<SingleFrame>(&response) {
            Ok(frame) if !frame.prompt.trim().is_empty() => SingleFrame {
                description: if frame.description.trim().is_empty() {
                    fallback::frame_description(frame_type).to_string()
                } else {
                    frame.description
                },
                prompt: frame.prompt,
            },
            Ok(_) => {
                warn!(frame_type = %frame_type, "Frame prompt response was empty, using fallback");
                fallback()
            }
            Err(e) => {
                warn!(frame_type = %frame_type, error = %e, "Frame prompt response unparsable, using fallback");
                fallback()
            }
        }
    }
}
