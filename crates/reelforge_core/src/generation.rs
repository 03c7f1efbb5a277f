//! Provider-facing option, result and configuration types.

use serde::{Deserialize, Serialize};

/// Capability a provider configuration serves.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Text generation
    Text,
    /// Image generation
    Image,
}

/// Recognized generation options.
///
/// Adapters use the keys they understand and ignore the rest.
///
/// # Examples
///
/// ```
/// use reelforge_core::GenerationOptions;
///
/// let options = GenerationOptions::builder()
///     .size("1024x1024")
///     .seed(42)
///     .build()
///     .unwrap();
/// assert_eq!(options.size.as_deref(), Some("1024x1024"));
/// assert!(options.temperature.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[serde(default)]
#[builder(default)]
pub struct GenerationOptions {
    /// Things the image should not contain
    #[builder(setter(into, strip_option))]
    pub negative_prompt: Option<String>,
    /// Size string such as `1024x1024`
    #[builder(setter(into, strip_option))]
    pub size: Option<String>,
    /// Quality hint
    #[builder(setter(into, strip_option))]
    pub quality: Option<String>,
    /// Style hint
    #[builder(setter(into, strip_option))]
    pub style: Option<String>,
    /// Sampling steps
    #[builder(setter(strip_option))]
    pub steps: Option<u32>,
    /// Classifier-free guidance scale
    #[builder(setter(strip_option))]
    pub cfg_scale: Option<f64>,
    /// Random seed
    #[builder(setter(strip_option))]
    pub seed: Option<i64>,
    /// Explicit width in pixels
    #[builder(setter(strip_option))]
    pub width: Option<u32>,
    /// Explicit height in pixels
    #[builder(setter(strip_option))]
    pub height: Option<u32>,
    /// Reference image URLs
    pub reference_images: Vec<String>,
    /// Model override
    #[builder(setter(into, strip_option))]
    pub model: Option<String>,
    /// Sampling temperature
    #[builder(setter(strip_option))]
    pub temperature: Option<f32>,
    /// Output token limit
    #[builder(setter(strip_option))]
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Creates a new options builder.
    pub fn builder() -> GenerationOptionsBuilder {
        GenerationOptionsBuilder::default()
    }

    /// `WIDTHxHEIGHT` from explicit dimensions, falling back to `size`.
    pub fn effective_size(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(format!("{w}x{h}")),
            _ => self.size.clone(),
        }
    }
}

/// Outcome of an image submission or poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Whether the image is ready
    pub completed: bool,
    /// Image location once completed
    pub image_url: Option<String>,
    /// Provider job token for asynchronous providers
    pub task_id: Option<String>,
    /// Width in pixels, 0 when unknown
    pub width: u32,
    /// Height in pixels, 0 when unknown
    pub height: u32,
    /// Provider-reported failure
    pub error: Option<String>,
}

impl ImageResult {
    /// A finished image.
    pub fn ready(image_url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            completed: true,
            image_url: Some(image_url.into()),
            width,
            height,
            ..Self::default()
        }
    }

    /// Accepted by an asynchronous provider, still running.
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::default()
        }
    }

    /// Failed on the provider side.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The provider error, if one was reported and is non-empty.
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Connection settings for one provider account.
///
/// # Examples
///
/// ```
/// use reelforge_core::{Capability, ProviderConfig};
///
/// let config = ProviderConfig::builder()
///     .name("main-image")
///     .provider("openai")
///     .base_url("https://api.openai.com/v1")
///     .api_key("sk-test")
///     .capability(Capability::Image)
///     .models(vec!["dall-e-3".to_string()])
///     .build()
///     .unwrap();
/// assert!(config.serves("dall-e-3"));
/// assert!(*config.is_active());
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ProviderConfig {
    /// Display name
    name: String,
    /// Provider family (openai, gemini, volcengine, ...)
    provider: String,
    /// API base URL
    base_url: String,
    /// Secret key
    api_key: String,
    /// Models served; the first is the default model
    #[builder(default)]
    #[serde(default)]
    models: Vec<String>,
    /// Capability served
    capability: Capability,
    /// Default for its capability
    #[builder(default)]
    #[serde(default)]
    is_default: bool,
    /// Tie-breaker among defaults; higher wins
    #[builder(default)]
    #[serde(default)]
    priority: i32,
    /// Inactive configs are never resolved
    #[builder(default = "true")]
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ProviderConfig {
    /// Creates a new provider config builder.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::default()
    }

    /// Whether this config lists `model`.
    pub fn serves(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Model to use when the caller names none.
    pub fn default_model(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("models", &self.models)
            .field("capability", &self.capability)
            .field("is_default", &self.is_default)
            .field("priority", &self.priority)
            .field("is_active", &self.is_active)
            .finish()
    }
}
