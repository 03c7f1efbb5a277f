//! Top-level error wrapper types.

use crate::{
    ConfigError, DatabaseError, JsonError, ParseError, PipelineError, ProviderError,
    StorageError, TaskError,
};

/// Union of every error family in the workspace.
///
/// # Examples
///
/// ```
/// use reelforge_error::{ReelforgeError, ProviderError, ProviderErrorKind};
///
/// let err: ReelforgeError =
///     ProviderError::new(ProviderErrorKind::Request("connection refused".into())).into();
/// assert!(format!("{}", err).contains("connection refused"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ReelforgeErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Provider resolution or call error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Model output could not be parsed
    #[from(ParseError)]
    Parse(ParseError),
    /// Task lifecycle error
    #[from(TaskError)]
    Task(TaskError),
    /// Orchestration error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Persistence error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Media cache error
    #[from(StorageError)]
    Storage(StorageError),
}

/// Reelforge error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Reelforge Error: {}", _0)]
pub struct ReelforgeError(Box<ReelforgeErrorKind>);

impl ReelforgeError {
    /// Create a new error from a kind.
    pub fn new(kind: ReelforgeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ReelforgeErrorKind {
        &self.0
    }

    /// Short message suitable for end users, without source locations.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelforge_error::{PipelineError, ReelforgeError};
    ///
    /// let err: ReelforgeError = PipelineError::validation("script is empty").into();
    /// assert_eq!(err.user_message(), "Validation failed: script is empty");
    /// ```
    pub fn user_message(&self) -> String {
        match self.kind() {
            ReelforgeErrorKind::Json(e) => e.message.clone(),
            ReelforgeErrorKind::Config(e) => e.message.clone(),
            ReelforgeErrorKind::Provider(e) => e.kind.to_string(),
            ReelforgeErrorKind::Parse(e) => e.message.clone(),
            ReelforgeErrorKind::Task(e) => e.kind.to_string(),
            ReelforgeErrorKind::Pipeline(e) => e.kind.to_string(),
            ReelforgeErrorKind::Database(e) => e.kind.to_string(),
            ReelforgeErrorKind::Storage(e) => e.kind.to_string(),
        }
    }
}

// Generic From implementation for any type that converts to ReelforgeErrorKind
impl<T> From<T> for ReelforgeError
where
    T: Into<ReelforgeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Reelforge operations.
pub type ReelforgeResult<T> = std::result::Result<T, ReelforgeError>;

#[cfg(feature = "database")]
impl From<diesel::result::Error> for ReelforgeErrorKind {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err.into())
    }
}

#[cfg(feature = "database")]
impl From<serde_json::Error> for ReelforgeErrorKind {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::Database(err.into())
    }
}
