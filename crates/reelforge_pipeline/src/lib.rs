//! Generation orchestrators for Reelforge.
//!
//! Each orchestrator validates its subject synchronously, reserves a slot on
//! the [`JobExecutor`](reelforge_tasks::JobExecutor), creates a task and runs
//! the generation in the background:
//!
//! - [`CharacterGenerator`] builds a drama's cast
//! - [`StoryboardGenerator`] splits an episode script into shots
//! - [`FramePromptGenerator`] writes first/key/last, panel and action frame prompts
//! - [`ImageGenerationService`] produces images, polling asynchronous providers
//! - [`BackgroundExtractor`] derives reusable background scenes
//!
//! Model output is read with [`extract_items`], which accepts either a bare
//! array or an object wrapping it, with or without surrounding prose.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod background;
mod characters;
mod context;
mod extraction;
mod fallback;
mod frame_prompt;
mod image;
pub mod prompts;
mod service;
mod settings;
mod shot;
mod storyboard;

pub use background::BackgroundExtractor;
pub use characters::CharacterGenerator;
pub use context::PipelineContext;
pub use extraction::{Extracted, JsonShape, extract_items, extract_object};
pub use fallback::{dedupe_backgrounds, fallback_frame_prompt, frame_description, frame_suffix};
pub use frame_prompt::{
    ACTION_SEQUENCE, FRAME_SEPARATOR, FramePromptGenerator, FramePromptResponse, MultiFrame,
    SingleFrame, panel_sequence,
};
pub use image::{ImageGenerationService, ImageSubmission, MAX_PROMPT_CHARS, MIN_PROMPT_CHARS};
pub use service::Pipeline;
pub use settings::{PipelineSettings, PipelineSettingsBuilder};
pub use shot::{GeneratedShot, MAX_SHOT_SECONDS, VideoStyle, compose_description, image_prompt, initial_pose, video_prompt};
pub use storyboard::{StoryboardGenerator, duration_minutes};
