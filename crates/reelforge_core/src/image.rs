//! Image generation records.

use crate::{FrameType, GenerationOptions, SubjectRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the generated image depicts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageType {
    /// Character portrait
    Character,
    /// Background scene
    Scene,
    /// Storyboard shot frame
    #[default]
    Storyboard,
}

/// Status of an image generation record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageStatus {
    /// Submitted
    Pending,
    /// Provider call or poll in progress
    Processing,
    /// Image stored
    Completed,
    /// Generation failed
    Failed,
}

/// Image generation fields before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewImageGeneration {
    /// Owning drama
    pub drama_id: i64,
    /// Record receiving the image
    pub target: Option<SubjectRef>,
    /// What the image depicts
    pub image_type: ImageType,
    /// Frame the image is for, when targeting a shot
    pub frame_type: Option<FrameType>,
    /// Provider family requested
    pub provider: String,
    /// Model requested
    pub model: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Generation options
    pub options: GenerationOptions,
}

/// A persisted image generation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeneration {
    /// Identifier
    pub id: i64,
    /// Owning drama
    pub drama_id: i64,
    /// Record receiving the image; cleared when that record is replaced
    pub target: Option<SubjectRef>,
    /// What the image depicts
    pub image_type: ImageType,
    /// Frame the image is for
    pub frame_type: Option<FrameType>,
    /// Provider family requested
    pub provider: String,
    /// Model requested
    pub model: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Generation options
    pub options: GenerationOptions,
    /// Status
    pub status: ImageStatus,
    /// Provider job token for asynchronous providers
    pub provider_task_id: Option<String>,
    /// Image location returned by the provider
    pub image_url: Option<String>,
    /// Local copy, when caching succeeded
    pub local_path: Option<String>,
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
    /// Failure message
    pub error_message: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Completion time
    pub completed_at: Option<DateTime<Utc>>,
}

/// Data written when an image generation succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCompletion {
    /// Provider image location
    pub image_url: String,
    /// Local cached copy
    pub local_path: Option<String>,
    /// Width, only when the provider reported a positive value
    pub width: Option<u32>,
    /// Height, only when the provider reported a positive value
    pub height: Option<u32>,
}
