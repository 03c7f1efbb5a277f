//! Error types for the Reelforge generation pipeline.
//!
//! Every error follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use reelforge_error::{ConfigError, ReelforgeResult};
//!
//! fn load_settings() -> ReelforgeResult<String> {
//!     Err(ConfigError::new("missing [polling] section"))?
//! }
//!
//! assert!(load_settings().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod json;
mod parse;
mod pipeline;
mod provider;
mod storage;
mod task;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{ReelforgeError, ReelforgeErrorKind, ReelforgeResult};
pub use json::JsonError;
pub use parse::{PREVIEW_LIMIT, ParseError};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use provider::{ProviderError, ProviderErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use task::{TaskError, TaskErrorKind};
