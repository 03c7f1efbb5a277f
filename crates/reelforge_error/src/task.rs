//! Task lifecycle errors.

/// Task registry failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TaskErrorKind {
    /// No task with this id
    #[display("Task not found: {}", _0)]
    NotFound(String),
    /// Attempted a status change the lifecycle forbids
    #[display("Invalid task transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
}

/// Task error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Task Error: {} at line {} in {}", kind, line, file)]
pub struct TaskError {
    /// The specific error condition
    pub kind: TaskErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl TaskError {
    /// Create a new TaskError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TaskErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
