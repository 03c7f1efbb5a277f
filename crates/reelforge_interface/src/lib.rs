//! Trait seams between the Reelforge orchestrators and their collaborators.
//!
//! Provider adapters, provider resolution, task persistence, story persistence
//! and media caching are all injected through these traits so that services
//! can be wired with real backends or test doubles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod traits;

pub use repository::{
    ImageGenerationRepository, ProviderConfigStore, StoryRepository, TaskRepository,
};
pub use traits::{ImageGenerator, MediaCache, ProviderResolver, TextGenerator};
