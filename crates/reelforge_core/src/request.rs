//! Submission requests accepted by the orchestrators.

use crate::{FrameType, GenerationOptions, ImageType, SubjectRef};
use serde::{Deserialize, Serialize};

/// Generate characters for a drama.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterGenerationRequest {
    /// Target drama
    pub drama_id: i64,
    /// Episode to associate the characters with
    pub episode_id: Option<i64>,
    /// Story outline; defaults to the drama's own description
    pub outline: Option<String>,
    /// Number of characters, default 5
    pub count: Option<u32>,
    /// Sampling temperature, default 0.7
    pub temperature: Option<f32>,
    /// Text model override
    pub model: Option<String>,
}

/// Break an episode into storyboard shots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryboardGenerationRequest {
    /// Target episode
    pub episode_id: i64,
    /// Text model override
    pub model: Option<String>,
}

/// Produce a frame prompt for a shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePromptRequest {
    /// Target shot
    pub storyboard_id: i64,
    /// Frame type
    pub frame_type: FrameType,
    /// Panel count for [`FrameType::Panel`]: 3 (default) or 4
    #[serde(default)]
    pub panel_count: Option<u32>,
    /// Text model override
    #[serde(default)]
    pub model: Option<String>,
}

/// Generate one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageGenerationRequest {
    /// Owning drama
    pub drama_id: i64,
    /// Record receiving the image
    pub target: Option<SubjectRef>,
    /// What the image depicts, default storyboard
    pub image_type: Option<ImageType>,
    /// Frame the image is for
    pub frame_type: Option<FrameType>,
    /// Provider family, default `openai`
    pub provider: Option<String>,
    /// Image model override
    pub model: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Generation options
    pub options: GenerationOptions,
}

/// Where background extraction reads from.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackgroundSource {
    /// The episode's script text
    #[default]
    Script,
    /// The episode's existing storyboard shots
    Storyboards,
}

/// Extract backgrounds for an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundExtractionRequest {
    /// Target episode
    pub episode_id: i64,
    /// Input to extract from
    pub source: BackgroundSource,
    /// Text model override
    pub model: Option<String>,
    /// Visual style appended to scene prompts
    pub style: Option<String>,
}
