//! Media cache storage errors.

/// Failure conditions when caching generated media locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StorageErrorKind {
    /// Cache directory could not be created
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// A stored file could not be read
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Media bytes could not be written
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Remote media could not be fetched
    #[display("Failed to download media: {}", _0)]
    Download(String),
    /// URL is not something the cache can fetch
    #[display("Unsupported media URL: {}", _0)]
    UnsupportedUrl(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use reelforge_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::UnsupportedUrl("data:xyz".to_string()));
/// assert!(format!("{}", err).contains("Unsupported media URL"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
