//! Orchestration errors.

/// Failure conditions raised by the generation orchestrators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Referenced drama, episode, shot, scene or character does not exist
    #[display("{} {} not found", kind, id)]
    SubjectNotFound {
        /// Subject kind (drama, episode, ...)
        kind: String,
        /// Subject identifier
        id: i64,
    },
    /// Input rejected before any work was scheduled
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// A replace operation produced no items; prior data was kept
    #[display("Generation returned no {}", _0)]
    EmptyResult(String),
    /// Asynchronous provider job never finished
    #[display("timeout: image generation took too long ({} polls)", attempts)]
    PollTimeout {
        /// Number of polls performed
        attempts: u32,
    },
    /// Provider reported the job as failed
    #[display("Provider job failed: {}", _0)]
    ProviderJobFailed(String),
    /// Executor queue is full
    #[display("Generation queue is full ({} jobs)", depth)]
    QueueFull {
        /// Configured queue depth
        depth: usize,
    },
}

/// Pipeline error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelforge_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::SubjectNotFound {
///     kind: "episode".into(),
///     id: 7,
/// });
/// assert!(format!("{}", err).contains("episode 7 not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a missing subject.
    #[track_caller]
    pub fn not_found(kind: impl Into<String>, id: i64) -> Self {
        Self::new(PipelineErrorKind::SubjectNotFound {
            kind: kind.into(),
            id,
        })
    }

    /// Shorthand for a validation failure.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(PipelineErrorKind::Validation(message.into()))
    }
}
