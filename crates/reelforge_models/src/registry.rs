//! Per-request provider resolution.

use crate::{
    GeminiImageClient, GeminiTextClient, HttpTransport, OpenAiImageClient, OpenAiTextClient,
    ProviderKind, VolcEngineImageClient,
};
use async_trait::async_trait;
use reelforge_core::{Capability, ProviderConfig};
use reelforge_error::{ProviderError, ProviderErrorKind, ReelforgeResult};
use reelforge_interface::{ImageGenerator, ProviderConfigStore, ProviderResolver, TextGenerator};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Provider configurations held in memory, typically loaded from a config file.
#[derive(Debug, Clone, Default)]
pub struct StaticProviderConfigs {
    configs: Vec<ProviderConfig>,
}

impl StaticProviderConfigs {
    /// Wrap a list of configurations.
    pub fn new(configs: Vec<ProviderConfig>) -> Self {
        Self { configs }
    }

    fn active(&self, capability: Capability) -> impl Iterator<Item = &ProviderConfig> {
        self.configs
            .iter()
            .filter(move |c| *c.is_active() && *c.capability() == capability)
    }
}

#[async_trait]
impl ProviderConfigStore for StaticProviderConfigs {
    async fn find_by_model(
        &self,
        capability: Capability,
        model: &str,
    ) -> ReelforgeResult<Option<ProviderConfig>> {
        Ok(self.active(capability).find(|c| c.serves(model)).cloned())
    }

    async fn default_for(&self, capability: Capability) -> ReelforgeResult<Option<ProviderConfig>> {
        Ok(self
            .active(capability)
            .max_by_key(|c| (*c.is_default(), *c.priority()))
            .cloned())
    }
}

/// Resolves a model name to a ready-to-use provider client.
///
/// Lookup by model first; when that fails for any reason, a warning is logged
/// and the capability's default configuration is used instead.
#[derive(Clone)]
pub struct ProviderRegistry {
    store: Arc<dyn ProviderConfigStore>,
    transport: HttpTransport,
}

impl ProviderRegistry {
    /// Build a registry over a configuration store.
    pub fn new(store: Arc<dyn ProviderConfigStore>, transport: HttpTransport) -> Self {
        Self { store, transport }
    }

    /// Choose the configuration for `model`, or the default for `capability`.
    #[instrument(skip(self))]
    pub async fn resolve_config(
        &self,
        capability: Capability,
        model: Option<&str>,
    ) -> ReelforgeResult<ProviderConfig> {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            match self.store.find_by_model(capability, model).await {
                Ok(Some(config)) => {
                    debug!(config = %config.name(), "Resolved provider by model");
                    return Ok(config);
                }
                Ok(None) => warn!(
                    model,
                    %capability,
                    "No provider serves model, falling back to default"
                ),
                Err(e) => warn!(
                    model,
                    %capability,
                    error = %e,
                    "Provider lookup failed, falling back to default"
                ),
            }
        }
        self.store.default_for(capability).await?.ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::NoProviderConfigured(
                capability.to_string(),
            ))
            .into()
        })
    }

    /// Requested model when the config serves it, else the config's first model.
    fn pick_model(config: &ProviderConfig, requested: Option<&str>) -> ReelforgeResult<String> {
        requested
            .filter(|m| config.serves(m))
            .or_else(|| config.default_model())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::ModelNotConfigured(format!(
                    "no model listed for provider config '{}'",
                    config.name()
                )))
                .into()
            })
    }
}

#[async_trait]
impl ProviderResolver for ProviderRegistry {
    async fn text_generator(&self, model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>> {
        let config = self.resolve_config(Capability::Text, model).await?;
        let model = Self::pick_model(&config, model)?;
        let transport = self.transport.clone();
        Ok(match ProviderKind::from_name(config.provider()) {
            ProviderKind::Gemini => Arc::new(GeminiTextClient::new(transport, &config, model)),
            _ => Arc::new(OpenAiTextClient::new(transport, &config, model)),
        })
    }

    async fn image_generator(
        &self,
        model: Option<&str>,
    ) -> ReelforgeResult<Arc<dyn ImageGenerator>> {
        let config = self.resolve_config(Capability::Image, model).await?;
        let model = Self::pick_model(&config, model)?;
        let transport = self.transport.clone();
        Ok(match ProviderKind::from_name(config.provider()) {
            ProviderKind::VolcEngine => {
                Arc::new(VolcEngineImageClient::new(transport, &config, model))
            }
            ProviderKind::Gemini => Arc::new(GeminiImageClient::new(transport, &config, model)),
            ProviderKind::OpenAi | ProviderKind::OpenAiCompatible => {
                Arc::new(OpenAiImageClient::new(transport, &config, model))
            }
        })
    }
}
