//! Story records: dramas, episodes, characters, scenes, shots and frame prompts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A drama series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drama {
    /// Identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Synopsis
    #[serde(default)]
    pub description: Option<String>,
    /// Genre label
    #[serde(default)]
    pub genre: Option<String>,
}

/// An episode of a drama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Identifier
    pub id: i64,
    /// Owning drama
    pub drama_id: i64,
    /// Position within the drama
    #[serde(default)]
    pub episode_number: i32,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Full script text
    #[serde(default)]
    pub script_content: Option<String>,
    /// Short description, used when no script exists
    #[serde(default)]
    pub description: Option<String>,
    /// Runtime in whole minutes, derived from shot durations
    #[serde(default)]
    pub duration_minutes: i32,
}

impl Episode {
    /// Script text to generate from: the script, else the description.
    pub fn source_text(&self) -> Option<&str> {
        [self.script_content.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }
}

/// A character of a drama.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Identifier
    pub id: i64,
    /// Owning drama
    pub drama_id: i64,
    /// Name, unique within the drama
    pub name: String,
    /// Role (protagonist, antagonist, ...)
    #[serde(default)]
    pub role: Option<String>,
    /// Background description
    #[serde(default)]
    pub description: Option<String>,
    /// Personality traits
    #[serde(default)]
    pub personality: Option<String>,
    /// Visual appearance
    #[serde(default)]
    pub appearance: Option<String>,
    /// Voice style hint
    #[serde(default)]
    pub voice_style: Option<String>,
    /// Generated portrait
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Character fields as produced by generation, before persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCharacter {
    /// Name
    pub name: String,
    /// Role
    pub role: Option<String>,
    /// Background description
    pub description: Option<String>,
    /// Personality traits
    pub personality: Option<String>,
    /// Visual appearance
    pub appearance: Option<String>,
    /// Voice style hint
    pub voice_style: Option<String>,
}

/// Image status of a background scene.
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
pub enum SceneStatus {
    /// No image yet
    #[default]
    Pending,
    /// An image is being generated
    Generating,
    /// Image available
    Generated,
    /// Last generation failed
    Failed,
}

/// A reusable background (location + time of day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Identifier
    pub id: i64,
    /// Owning drama
    pub drama_id: i64,
    /// Episode the scene was extracted for
    #[serde(default)]
    pub episode_id: Option<i64>,
    /// Location
    pub location: String,
    /// Time of day
    pub time: String,
    /// Image prompt for the background
    #[serde(default)]
    pub prompt: String,
    /// Number of shots using this background
    #[serde(default)]
    pub storyboard_count: i32,
    /// Image status
    #[serde(default)]
    pub status: SceneStatus,
    /// Generated image
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Scene fields as produced by extraction, before persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewScene {
    /// Location
    pub location: String,
    /// Time of day
    pub time: String,
    /// Image prompt
    pub prompt: String,
    /// Number of shots using this background
    pub storyboard_count: i32,
    /// Shots of the episode to link to this scene
    #[serde(default)]
    pub shot_numbers: Vec<i32>,
}

/// Everything describing a shot apart from its identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotSpec {
    /// Background the shot takes place in
    pub scene_id: Option<i64>,
    /// Position within the episode
    pub shot_number: i32,
    /// Short title
    pub title: Option<String>,
    /// Location
    pub location: Option<String>,
    /// Time of day
    pub time: Option<String>,
    /// Shot size (close-up, wide, ...)
    pub shot_type: Option<String>,
    /// Camera angle
    pub angle: Option<String>,
    /// Camera movement
    pub movement: Option<String>,
    /// Action in the shot
    pub action: Option<String>,
    /// Spoken line
    pub dialogue: Option<String>,
    /// Visible outcome of the action
    pub result: Option<String>,
    /// Atmosphere
    pub atmosphere: Option<String>,
    /// Emotion
    pub emotion: Option<String>,
    /// Composed description
    pub description: Option<String>,
    /// Prompt for the shot's first frame
    pub image_prompt: Option<String>,
    /// Prompt for video generation
    pub video_prompt: Option<String>,
    /// Background music prompt
    pub bgm_prompt: Option<String>,
    /// Sound effects
    pub sound_effect: Option<String>,
    /// Duration in seconds
    pub duration: i32,
    /// Characters appearing in the shot
    pub character_ids: Vec<i64>,
}

/// A persisted storyboard shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    /// Identifier
    pub id: i64,
    /// Owning episode
    pub episode_id: i64,
    /// Final composed image
    #[serde(default)]
    pub composed_image: Option<String>,
    /// Shot content
    #[serde(flatten)]
    pub shot: ShotSpec,
}

/// Which frame of a shot a prompt describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FrameType {
    /// Opening frame
    First,
    /// Action climax
    Key,
    /// Closing frame
    Last,
    /// Multi-panel storyboard board
    Panel,
    /// Five-frame action sequence
    Action,
}

/// A stored frame prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePrompt {
    /// Identifier
    pub id: i64,
    /// Shot the prompt belongs to
    pub storyboard_id: i64,
    /// Frame type; at most one record per shot and type
    pub frame_type: FrameType,
    /// Prompt text
    pub prompt: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Layout hint for multi-frame types
    #[serde(default)]
    pub layout: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Frame prompt fields before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFramePrompt {
    /// Shot the prompt belongs to
    pub storyboard_id: i64,
    /// Frame type
    pub frame_type: FrameType,
    /// Prompt text
    pub prompt: String,
    /// Human-readable description
    pub description: Option<String>,
    /// Layout hint
    pub layout: Option<String>,
}
