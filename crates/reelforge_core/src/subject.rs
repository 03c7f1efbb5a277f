//! Typed references to the records a task or artifact is about.

use serde::{Deserialize, Serialize};

/// Kind of record a [`SubjectRef`] points at.
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
pub enum SubjectKind {
    /// A drama (series)
    Drama,
    /// An episode of a drama
    Episode,
    /// A storyboard shot
    Storyboard,
    /// An extracted background scene
    Scene,
    /// A character
    Character,
    /// An image generation record
    ImageGeneration,
}

/// Explicitly tagged reference: the kind is never inferred from context.
///
/// # Examples
///
/// ```
/// use reelforge_core::{SubjectKind, SubjectRef};
///
/// let subject = SubjectRef::episode(12);
/// assert_eq!(subject.kind, SubjectKind::Episode);
/// assert_eq!(subject.to_string(), "episode:12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{}:{}", kind, id)]
pub struct SubjectRef {
    /// What the id refers to
    pub kind: SubjectKind,
    /// Record identifier
    pub id: i64,
}

impl SubjectRef {
    /// Build a reference from its parts.
    pub fn new(kind: SubjectKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// Reference to a drama.
    pub fn drama(id: i64) -> Self {
        Self::new(SubjectKind::Drama, id)
    }

    /// Reference to an episode.
    pub fn episode(id: i64) -> Self {
        Self::new(SubjectKind::Episode, id)
    }

    /// Reference to a storyboard shot.
    pub fn storyboard(id: i64) -> Self {
        Self::new(SubjectKind::Storyboard, id)
    }

    /// Reference to a scene.
    pub fn scene(id: i64) -> Self {
        Self::new(SubjectKind::Scene, id)
    }

    /// Reference to a character.
    pub fn character(id: i64) -> Self {
        Self::new(SubjectKind::Character, id)
    }
}
