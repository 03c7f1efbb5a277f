//! Layered TOML configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Bundled defaults (`reelforge.toml` shipped with the crate)
//! 2. `~/.config/reelforge/reelforge.toml`
//! 3. `./reelforge.toml`
//!
//! Provider API keys never live in the file; each provider names the
//! environment variable that holds its key.

use config::{Config, File, FileFormat};
use reelforge_core::{Capability, ProviderConfig};
use reelforge_error::{ConfigError, ReelforgeError, ReelforgeResult};
use reelforge_models::{HttpTransport, RetryPolicy};
use reelforge_pipeline::PipelineSettings;
use reelforge_tasks::{ExecutorConfig, PollConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../reelforge.toml");

/// One `[[providers]]` entry.
///
/// ```toml
/// [[providers]]
/// name = "openai-text"
/// provider = "openai"
/// base_url = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
/// models = ["gpt-4o-mini"]
/// capability = "text"
/// is_default = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderSection {
    /// Display name
    pub name: String,
    /// Provider family (openai, volcengine, gemini, ...)
    pub provider: String,
    /// API base URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Models served; the first is the default
    #[serde(default)]
    pub models: Vec<String>,
    /// Capability served
    pub capability: Capability,
    /// Default for its capability
    #[serde(default)]
    pub is_default: bool,
    /// Tie-breaker among defaults
    #[serde(default)]
    pub priority: i32,
    /// Inactive providers are never resolved
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// `[polling]`: cadence for asynchronous image jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingSection {
    /// Seconds between polls
    pub interval_secs: u64,
    /// Polls before giving up
    pub max_attempts: u32,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 60,
        }
    }
}

/// `[executor]`: background job limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Jobs running at the same time
    pub max_concurrent: usize,
    /// Jobs running or waiting
    pub queue_depth: usize,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        let defaults = ExecutorConfig::default();
        Self {
            max_concurrent: defaults.max_concurrent,
            queue_depth: defaults.queue_depth,
        }
    }
}

/// `[generation]`: orchestrator defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSection {
    /// Output token limit for storyboard decomposition
    pub storyboard_max_tokens: u32,
    /// Character generation temperature
    pub character_temperature: f32,
    /// Characters generated when none is requested
    pub default_character_count: u32,
    /// Largest accepted character count
    pub max_character_count: u32,
    /// Background extraction temperature
    pub background_temperature: f32,
    /// Style appended to video prompts
    pub video_style: Option<String>,
    /// Aspect ratio appended to video prompts
    pub video_ratio: Option<String>,
    /// Provider recorded on image requests that name none
    pub default_image_provider: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        let defaults = PipelineSettings::default();
        Self {
            storyboard_max_tokens: defaults.storyboard_max_tokens,
            character_temperature: defaults.character_temperature,
            default_character_count: defaults.default_character_count,
            max_character_count: defaults.max_character_count,
            background_temperature: defaults.background_temperature,
            video_style: defaults.video_style,
            video_ratio: defaults.video_ratio,
            default_image_provider: defaults.default_image_provider,
        }
    }
}

/// `[http]`: provider transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSection {
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Retries of transient failures
    pub max_retries: usize,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: RetryPolicy::default().max_retries,
        }
    }
}

/// `[storage]`: local media cache and optional database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for cached images; caching is off when unset
    pub cache_dir: Option<PathBuf>,
    /// PostgreSQL URL; when set, records and tasks live in the database
    /// instead of the project file (needs the `postgres` feature)
    pub database_url: Option<String>,
}

/// Top-level Reelforge configuration.
///
/// # Examples
///
/// ```
/// use reelforge::ReelforgeConfig;
///
/// let config = ReelforgeConfig::from_toml_str("[polling]\nmax_attempts = 3").unwrap();
/// assert_eq!(config.polling.max_attempts, 3);
/// assert_eq!(config.polling.interval_secs, 5);
/// assert!(config.providers.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReelforgeConfig {
    /// Provider accounts
    #[serde(default)]
    pub providers: Vec<ProviderSection>,
    /// Async image polling
    #[serde(default)]
    pub polling: PollingSection,
    /// Background job limits
    #[serde(default)]
    pub executor: ExecutorSection,
    /// Orchestrator defaults
    #[serde(default)]
    pub generation: GenerationSection,
    /// Provider transport
    #[serde(default)]
    pub http: HttpSection,
    /// Media cache and database
    #[serde(default)]
    pub storage: StorageSection,
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> ReelforgeResult<ReelforgeConfig> {
    builder
        .build()
        .map_err(|e| {
            ReelforgeError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?
        .try_deserialize()
        .map_err(|e| {
            ReelforgeError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })
}

impl ReelforgeConfig {
    /// Load bundled defaults overridden by the user's files.
    ///
    /// Missing user files are skipped.
    #[instrument]
    pub fn load() -> ReelforgeResult<Self> {
        debug!("Loading configuration: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/reelforge/reelforge.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("reelforge").required(false));
        build(builder)
    }

    /// Load bundled defaults overridden by one specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ReelforgeResult<Self> {
        debug!("Loading configuration from file");
        build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Bundled defaults overridden by `toml`.
    pub fn from_toml_str(toml: &str) -> ReelforgeResult<Self> {
        build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    /// Provider configurations with keys read from the process environment.
    pub fn provider_configs(&self) -> ReelforgeResult<Vec<ProviderConfig>> {
        self.provider_configs_with(|var| std::env::var(var).ok())
    }

    /// Provider configurations with keys looked up through `lookup`.
    ///
    /// Providers whose key variable is unset or empty are skipped with a
    /// warning, so a missing key surfaces as "no provider configured" at
    /// generation time rather than failing startup.
    pub fn provider_configs_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ReelforgeResult<Vec<ProviderConfig>> {
        let mut configs = Vec::with_capacity(self.providers.len());
        for section in &self.providers {
            let Some(api_key) = lookup(&section.api_key_env).filter(|k| !k.trim().is_empty())
            else {
                warn!(
                    provider = %section.name,
                    variable = %section.api_key_env,
                    "API key variable not set, skipping provider"
                );
                continue;
            };
            let config = ProviderConfig::builder()
                .name(section.name.clone())
                .provider(section.provider.clone())
                .base_url(section.base_url.clone())
                .api_key(api_key)
                .models(section.models.clone())
                .capability(section.capability)
                .is_default(section.is_default)
                .priority(section.priority)
                .is_active(section.is_active)
                .build()
                .map_err(|e| {
                    ConfigError::new(format!("Invalid provider '{}': {}", section.name, e))
                })?;
            configs.push(config);
        }
        Ok(configs)
    }

    /// Poll cadence for asynchronous image jobs.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.polling.interval_secs),
            max_attempts: self.polling.max_attempts,
        }
    }

    /// Background job limits.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrent: self.executor.max_concurrent,
            queue_depth: self.executor.queue_depth,
        }
    }

    /// Orchestrator settings.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let g = &self.generation;
        PipelineSettings {
            storyboard_max_tokens: g.storyboard_max_tokens,
            character_temperature: g.character_temperature,
            default_character_count: g.default_character_count,
            max_character_count: g.max_character_count,
            background_temperature: g.background_temperature,
            video_style: g.video_style.clone(),
            video_ratio: g.video_ratio.clone(),
            default_image_provider: g.default_image_provider.clone(),
            poll: self.poll_config(),
        }
    }

    /// HTTP transport shared by provider clients and the media cache.
    pub fn transport(&self) -> ReelforgeResult<HttpTransport> {
        let retry = RetryPolicy {
            max_retries: self.http.max_retries,
            ..RetryPolicy::default()
        };
        Ok(HttpTransport::new(
            Duration::from_secs(self.http.timeout_secs),
            retry,
        )?)
    }
}
