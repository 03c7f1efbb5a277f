//! Google Gemini `generateContent` adapters for text and images.

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
use tracing::instrument;

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    fn parts(self) -> impl Iterator<Item = ResponsePart> {
        self.candidates
            .into_iter()
            .next()
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
    }

    fn text(self) -> Option<String> {
        let text: String = self.parts().filter_map(|part| part.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn image_data_uri(self) -> Option<String> {
        self.parts()
            .find_map(|part| part.inline_data)
            .map(|inline| format!("data:{};base64,{}", inline.mime_type, inline.data))
    }
}

fn user_content(prompt: &str) -> Content<'_> {
    Content {
        role: Some("user"),
        parts: vec![Part { text: prompt }],
    }
}

/// Text adapter for Gemini models.
#[derive(Debug, Clone)]
pub struct GeminiTextClient {
    transport: HttpTransport,
    url: String,
    api_key: String,
    provider: String,
    model: String,
}

impl GeminiTextClient {
    /// Build a client for `config` and `model`.
    pub fn new(transport: HttpTransport, config: &ProviderConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let url = join_url(config.base_url(), &ProviderKind::Gemini.text_endpoint(&model));
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
impl TextGenerator for GeminiTextClient {
    #[instrument(skip(self, prompt, system_prompt, options), fields(model = %self.model))]
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &GenerationOptions,
    ) -> ReelforgeResult<String> {
        let request = GenerateContentRequest {
            contents: vec![user_content(prompt)],
            system_instruction: system_prompt
                .filter(|s| !s.is_empty())
                .map(|text| Content {
                    role: None,
                    parts: vec![Part { text }],
                }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                ..GenerationConfig::default()
            },
        };
        let response: GenerateContentResponse = self
            .transport
            .post_json(&self.url, Auth::GoogleKey(&self.api_key), &request)
            .await?;
        Ok(response.text().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(
                "Gemini response contained no text".to_string(),
            ))
        })?)
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Image adapter for Gemini image models. Always synchronous.
#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    transport: HttpTransport,
    url: String,
    api_key: String,
    provider: String,
    model: String,
}

impl GeminiImageClient {
    /// Build a client for `config` and `model`.
    pub fn new(transport: HttpTransport, config: &ProviderConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let url = join_url(config.base_url(), &ProviderKind::Gemini.image_endpoint(&model));
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
impl ImageGenerator for GeminiImageClient {
    #[instrument(skip(self, prompt, options), fields(model = %self.model))]
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ReelforgeResult<ImageResult> {
        let request = GenerateContentRequest {
            contents: vec![user_content(prompt)],
            system_instruction: None,
            generation_config: GenerationConfig {
                seed: options.seed,
                response_modalities: vec!["IMAGE"],
                ..GenerationConfig::default()
            },
        };
        let response: GenerateContentResponse = self
            .transport
            .post_json(&self.url, Auth::GoogleKey(&self.api_key), &request)
            .await?;
        let url = response.image_data_uri().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(
                "Gemini response contained no image".to_string(),
            ))
        })?;
        let (width, height) = parse_size(options.effective_size().as_deref());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_parts_are_concatenated() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{\"a\""},{"text":":1}]"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().unwrap(), r#"[{"a":1}]"#);
    }

    #[test]
    fn inline_image_becomes_data_uri() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"QUJD"}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.image_data_uri().unwrap(), "data:image/png;base64,QUJD");
    }

    #[test]
    fn request_uses_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![user_content("hi")],
            system_instruction: None,
            generation_config: GenerationConfig {
                max_output_tokens: Some(16000),
                ..GenerationConfig::default()
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 16000);
    }
}
