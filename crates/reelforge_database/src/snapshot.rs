//! Serializable image of a store's contents.

use reelforge_core::{
    Character, Drama, Episode, FramePrompt, ImageGeneration, Scene, Storyboard,
};
use serde::{Deserialize, Serialize};

/// Every record held by an [`InMemoryStore`](crate::InMemoryStore).
///
/// Used to seed a store from a project file and to write it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    /// Dramas
    pub dramas: Vec<Drama>,
    /// Episodes
    pub episodes: Vec<Episode>,
    /// Characters
    pub characters: Vec<Character>,
    /// `(episode_id, character_id)` associations
    pub episode_characters: Vec<(i64, i64)>,
    /// Background scenes
    pub scenes: Vec<Scene>,
    /// Storyboard shots
    pub storyboards: Vec<Storyboard>,
    /// Frame prompts
    pub frame_prompts: Vec<FramePrompt>,
    /// Image generation records
    pub image_generations: Vec<ImageGeneration>,
}
