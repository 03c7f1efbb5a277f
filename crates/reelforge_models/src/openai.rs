//! OpenAI-compatible chat and image adapters.

use crate::{
    ProviderKind,
    endpoint::join_url,
    http::{Auth, HttpTransport, parse_size},
};
use async_trait::async_trait;
use reelforge_core::{GenerationOptions, ImageResult, ProviderConfig};
use reelforge_error::{ProviderError, ProviderErrorKind, ReelforgeResult};
use reelforge_interface::{ImageGenerator, TextGenerator};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_text(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(
                "chat completion contained no content".to_string(),
            ))
        })
}

/// Text adapter for `/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiTextClient {
    transport: HttpTransport,
    url: String,
    api_key: String,
    provider: String,
    model: String,
}

impl OpenAiTextClient {
    /// Build a client for `config` and `model`.
    pub fn new(transport: HttpTransport, config: &ProviderConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let url = join_url(
            config.base_url(),
            &ProviderKind::OpenAi.text_endpoint(&model),
        );
        debug!(provider = %config.provider(), %model, "Creating OpenAI-compatible text client");
        Self {
            transport,
            url,
            api_key: config.api_key().clone(),
            provider: config.provider().clone(),
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextClient {
    #[instrument(skip(self, prompt, system_prompt, options), fields(model = %self.model))]
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> ReelforgeResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };
        let response: ChatResponse = self
            .transport
            .post_json(&self.url, Auth::Bearer(&self.api_key), &request)
            .await?;
        Ok(first_choice_text(response)?)
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageResponse {
    #[serde(default)]
    pub(crate) data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageDatum {
    #[serde(default)]
    pub(crate) url: Option<String>,
    #[serde(default)]
    pub(crate) b64_json: Option<String>,
    #[serde(default)]
    pub(crate) size: Option<String>,
}

impl ImageDatum {
    /// Remote URL, or inline base64 turned into a data URI.
    pub(crate) fn into_url(self) -> Option<String> {
        self.url
            .filter(|u| !u.is_empty())
            .or_else(|| self.b64_json.map(|b64| format!("data:image/png;base64,{b64}")))
    }
}

/// Image adapter for `/images/generations`. Always synchronous.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    transport: HttpTransport,
    url: String,
    api_key: String,
    provider: String,
    model: String,
}

impl OpenAiImageClient {
    /// Build a client for `config` and `model`.
    pub fn new(transport: HttpTransport, config: &ProviderConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let url = join_url(
            config.base_url(),
            &ProviderKind::OpenAi.image_endpoint(&model),
        );
        Self {
            transport,
            url,
            api_key: config.api_key().clone(),
            provider: config.provider().clone(),
            model,
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    #[instrument(skip(self, prompt, options), fields(model = %self.model))]
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ReelforgeResult<ImageResult> {
        let size = options.effective_size();
        let request = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: size.clone(),
            quality: options.quality.as_deref(),
            style: options.style.as_deref(),
        };
        let response: ImageResponse = self
            .transport
            .post_json(&self.url, Auth::Bearer(&self.api_key), &request)
            .await?;
        let (width, height) = parse_size(size.as_deref());
        let url = response
            .data
            .into_iter()
            .next()
            .and_then(ImageDatum::into_url)
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::InvalidResponse(
                    "image response contained no image".to_string(),
                ))
            })?;
        Ok(ImageResult::ready(url, width, height))
    }

    async fn poll(&self, _task_id: &str) -> ReelforgeResult<ImageResult> {
        Err(ProviderError::new(ProviderErrorKind::UnsupportedOperation {
            provider: self.provider.clone(),
            operation: "polling".to_string(),
        })
        .into())
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
