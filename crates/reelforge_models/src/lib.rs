//! AI provider adapters and per-request provider resolution.
//!
//! Adapters speak each provider family's HTTP API and implement the
//! [`TextGenerator`](reelforge_interface::TextGenerator) and
//! [`ImageGenerator`](reelforge_interface::ImageGenerator) traits.
//! [`ProviderRegistry`] picks a configuration for a model name, falling back
//! to the capability's default, and builds the matching adapter.
//! [`FileMediaCache`] keeps local copies of generated media.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod endpoint;
mod gemini;
mod http;
mod openai;
mod registry;
mod volcengine;

pub use cache::FileMediaCache;
pub use endpoint::ProviderKind;
pub use gemini::{GeminiImageClient, GeminiTextClient};
pub use http::{Auth, HttpTransport, RetryPolicy};
pub use openai::{OpenAiImageClient, OpenAiTextClient};
pub use registry::{ProviderRegistry, StaticProviderConfigs};
pub use volcengine::VolcEngineImageClient;
