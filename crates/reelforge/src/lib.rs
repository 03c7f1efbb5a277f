//! Reelforge: an asynchronous generation pipeline for narrative media.
//!
//! Long-running AI jobs (character casts, storyboard decomposition, frame
//! prompts, images and background scenes) run in the background and are
//! tracked as tasks with progress, results and errors.
//!
//! # Architecture
//!
//! - `reelforge_error` - Error types
//! - `reelforge_core` - Domain records, requests and task lifecycle
//! - `reelforge_interface` - Provider and repository traits
//! - `reelforge_models` - Provider adapters, resolution and media cache
//! - `reelforge_tasks` - Task registry, polling and bounded execution
//! - `reelforge_database` - In-memory and PostgreSQL stores
//! - `reelforge_pipeline` - The orchestrators
//!
//! This crate re-exports everything and adds layered configuration, logging
//! setup and JSON project files.
//!
//! # Cargo Features
//!
//! - `postgres` - PostgreSQL story store

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod project;

pub use config::{
    ExecutorSection, GenerationSection, HttpSection, PollingSection, ProviderSection,
    ReelforgeConfig, StorageSection,
};
pub use observability::{ObservabilityConfig, init_observability};
pub use project::{Project, ProjectFile};

pub use reelforge_core::*;
pub use reelforge_database::*;
pub use reelforge_error::*;
pub use reelforge_interface::*;
pub use reelforge_models::*;
pub use reelforge_pipeline::*;
pub use reelforge_tasks::*;
