//! Generation task records and their lifecycle.

use crate::{SubjectRef, truncate_chars};
use chrono::{DateTime, Utc};
use reelforge_error::{TaskError, TaskErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Longest diagnostic detail kept on a failed task.
const ERROR_DETAIL_LIMIT: usize = 1000;

/// Opaque, globally unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What kind of work a task performs.
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
pub enum TaskType {
    /// Generate characters for a drama
    CharacterGeneration,
    /// Break an episode script into storyboard shots
    StoryboardGeneration,
    /// Produce a frame prompt for one shot
    FramePromptGeneration,
    /// Extract reusable background scenes for an episode
    BackgroundExtraction,
    /// Produce an image from a prompt
    ImageGeneration,
}

/// Task lifecycle state.
///
/// Moves only forward: `pending -> processing -> completed | failed`.
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
pub enum TaskStatus {
    /// Created, not started
    Pending,
    /// Work in progress
    Processing,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
}

impl TaskStatus {
    /// Whether no further transitions are allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelforge_core::TaskStatus;
    ///
    /// assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Processing));
    /// assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
    /// assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Processing));
    /// ```
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

/// A tracked unit of asynchronous generation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id
    pub id: TaskId,
    /// Kind of work
    pub task_type: TaskType,
    /// Record the work is about
    pub subject: SubjectRef,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Percent complete, 0..=100
    pub progress: u8,
    /// Human-readable status message
    pub message: String,
    /// Structured result, present only when completed
    pub result: Option<serde_json::Value>,
    /// Diagnostic detail, present only when failed
    pub error: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Time the task reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a pending task.
    pub fn new(task_type: TaskType, subject: SubjectRef) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            task_type,
            subject,
            status: TaskStatus::Pending,
            progress: 0,
            message: "Task created".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[track_caller]
    fn transition(&mut self, next: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskError::new(TaskErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            }));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to `processing` (or stay there) and record progress.
    ///
    /// Only `processing` is accepted as a target; terminal states are reached
    /// through [`Task::complete`] and [`Task::fail`].
    #[track_caller]
    pub fn advance(
        &mut self,
        status: TaskStatus,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<(), TaskError> {
        if status != TaskStatus::Processing {
            return Err(TaskError::new(TaskErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            }));
        }
        self.transition(status)?;
        self.progress = progress.min(100);
        self.message = message.into();
        Ok(())
    }

    /// Record a successful result.
    #[track_caller]
    pub fn complete(&mut self, result: serde_json::Value) -> Result<(), TaskError> {
        self.transition(TaskStatus::Completed)?;
        self.progress = 100;
        self.message = "Completed".to_string();
        self.result = Some(result);
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Record a failure: `message` is shown to users, `detail` is diagnostic.
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>, detail: &str) -> Result<(), TaskError> {
        self.transition(TaskStatus::Failed)?;
        self.message = message.into();
        self.error = Some(truncate_chars(detail, ERROR_DETAIL_LIMIT));
        self.completed_at = Some(self.updated_at);
        Ok(())
    }
}
