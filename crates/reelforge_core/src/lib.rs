//! Core data types for the Reelforge generation pipeline.
//!
//! Tasks, subject references, story records (dramas, episodes, characters,
//! scenes, storyboard shots, frame prompts), image generation records and the
//! provider-facing option and result types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod generation;
mod image;
mod request;
mod story;
mod subject;
mod task;
mod text;

pub use generation::{
    Capability, GenerationOptions, GenerationOptionsBuilder, ImageResult, ProviderConfig,
    ProviderConfigBuilder,
};
pub use image::{ImageCompletion, ImageGeneration, ImageStatus, ImageType, NewImageGeneration};
pub use request::{
    BackgroundExtractionRequest, BackgroundSource, CharacterGenerationRequest,
    FramePromptRequest, ImageGenerationRequest, StoryboardGenerationRequest,
};
pub use story::{
    Character, Drama, Episode, FramePrompt, FrameType, NewCharacter, NewFramePrompt, NewScene,
    Scene, SceneStatus, ShotSpec, Storyboard,
};
pub use subject::{SubjectKind, SubjectRef};
pub use task::{Task, TaskId, TaskStatus, TaskType};
pub use text::{truncate_chars, truncate_url_for_log};
