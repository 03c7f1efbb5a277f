//! Provider resolution and invocation errors.

/// Failure conditions when resolving or calling an AI provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// No configuration exists for a capability, not even a default
    #[display("No {} provider configured", _0)]
    NoProviderConfigured(String),
    /// The requested model name is not served by any active configuration
    #[display("Model '{}' is not configured", _0)]
    ModelNotConfigured(String),
    /// The adapter does not implement an operation (e.g. polling a sync provider)
    #[display("Provider '{}' does not support {}", provider, operation)]
    UnsupportedOperation {
        /// Provider name
        provider: String,
        /// Operation name
        operation: String,
    },
    /// Provider answered with an error status
    #[display("Provider API error (status {}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body or message
        message: String,
    },
    /// Request could not be built or sent
    #[display("Provider request failed: {}", _0)]
    Request(String),
    /// Response did not have the expected structure
    #[display("Invalid provider response: {}", _0)]
    InvalidResponse(String),
}

impl ProviderErrorKind {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Request(_) => true,
            _ => false,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelforge_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::NoProviderConfigured("image".into()));
/// assert!(format!("{}", err).contains("No image provider"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The specific error condition
    pub kind: ProviderErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
