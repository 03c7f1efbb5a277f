//! Errors raised when model output cannot be interpreted.

/// Maximum number of characters of raw model output kept in a [`ParseError`].
pub const PREVIEW_LIMIT: usize = 500;

/// Model output could not be parsed into the expected structure.
///
/// Carries a bounded preview of the offending text for diagnostics.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} (response preview: {:?}) at line {} in {}", message, preview, line, file)]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// First [`PREVIEW_LIMIT`] characters of the raw response
    pub preview: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ParseError {
    /// Create a parse error, truncating `raw` to a preview.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelforge_error::{ParseError, PREVIEW_LIMIT};
    ///
    /// let raw = "x".repeat(2000);
    /// let err = ParseError::new("no JSON found", &raw);
    /// assert_eq!(err.preview.chars().count(), PREVIEW_LIMIT);
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>, raw: &str) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            preview: raw.chars().take(PREVIEW_LIMIT).collect(),
            line: location.line(),
            file: location.file(),
        }
    }
}
