//! Provider-facing traits.

use async_trait::async_trait;
use reelforge_core::{GenerationOptions, ImageResult};
use reelforge_error::ReelforgeResult;
use std::sync::Arc;

/// A model that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`, optionally steered by `system_prompt`.
    ///
    /// Options the provider does not understand are ignored.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> ReelforgeResult<String>;

    /// Provider name (e.g., "openai", "gemini").
    fn provider_name(&self) -> &str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// A model that turns a prompt into an image.
///
/// Synchronous providers return a completed [`ImageResult`] from `generate`.
/// Asynchronous providers return a job token and are finished through `poll`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Submit an image request.
    async fn generate(&self, prompt: &str, options: &GenerationOptions)
    -> ReelforgeResult<ImageResult>;

    /// Query an asynchronous job by its provider token.
    async fn poll(&self, task_id: &str) -> ReelforgeResult<ImageResult>;

    /// Provider name.
    fn provider_name(&self) -> &str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Chooses a provider client per request.
///
/// Given a model name, returns a client for the configuration that serves it;
/// when none does, falls back to the default configuration for the capability.
#[async_trait]
pub trait ProviderResolver: Send + Sync {
    /// Client for text generation.
    async fn text_generator(&self, model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>>;

    /// Client for image generation.
    async fn image_generator(
        &self,
        model: Option<&str>,
    ) -> ReelforgeResult<Arc<dyn ImageGenerator>>;
}

/// Best-effort local copy of remote media.
#[async_trait]
pub trait MediaCache: Send + Sync {
    /// Download `url` into the cache under `category`, returning the local path.
    async fn cache(&self, url: &str, category: &str) -> ReelforgeResult<String>;
}
