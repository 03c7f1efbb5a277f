//! VolcEngine Ark image adapter.
//!
//! Submissions may finish inline or return a job id that is polled later.

use crate::{
    ProviderKind,
    endpoint::join_url,
    http::{Auth, HttpTransport, parse_size},
    openai::ImageDatum,
};
use async_trait::async_trait;
use reelforge_core::{GenerationOptions, ImageResult, ProviderConfig};
use reelforge_error::{ProviderError, ProviderErrorKind, ReelforgeResult};
use reelforge_interface::ImageGenerator;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct ArkImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    response_format: &'static str,
    watermark: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a [String]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArkImageResponse {
    data: Vec<ImageDatum>,
    id: Option<String>,
    task_id: Option<String>,
    status: Option<String>,
    error: Option<ArkError>,
}

#[derive(Debug, Deserialize)]
struct ArkError {
    #[serde(default)]
    message: String,
}

impl ArkImageResponse {
    /// Interpret a submission or poll response.
    fn into_result(self, requested_size: Option<&str>) -> ImageResult {
        if let Some(error) = self.error.filter(|e| !e.message.is_empty()) {
            return ImageResult::failed(error.message);
        }
        let status = self.status.unwrap_or_default().to_ascii_lowercase();
        if status == "failed" || status == "cancelled" {
            return ImageResult::failed(format!("job {status}"));
        }
        if let Some(datum) = self.data.into_iter().next() {
            let (width, height) = parse_size(datum.size.as_deref().or(requested_size));
            if let Some(url) = datum.into_url() {
                return ImageResult::ready(url, width, height);
            }
        }
        match self.task_id.or(self.id) {
            Some(job) => ImageResult::pending(job),
            None => ImageResult::failed("response contained neither an image nor a job id"),
        }
    }
}

/// Image adapter for VolcEngine, Volces and Doubao endpoints.
#[derive(Debug, Clone)]
pub struct VolcEngineImageClient {
    transport: HttpTransport,
    url: String,
    api_key: String,
    provider: String,
    model: String,
}

impl VolcEngineImageClient {
    /// Build a client for `config` and `model`.
    pub fn new(transport: HttpTransport, config: &ProviderConfig, model: impl Into<String>) -> Self {
        let model = model.into();
        let url = join_url(
            config.base_url(),
            &ProviderKind::VolcEngine.image_endpoint(&model),
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
impl ImageGenerator for VolcEngineImageClient {
    #[instrument(skip(self, prompt, options), fields(model = %self.model))]
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> ReelforgeResult<ImageResult> {
        let size = options.effective_size();
        let request = ArkImageRequest {
            model: &self.model,
            prompt,
            response_format: "url",
            watermark: false,
            size: size.clone(),
            seed: options.seed,
            guidance_scale: options.cfg_scale,
            negative_prompt: options.negative_prompt.as_deref(),
            image: (!options.reference_images.is_empty())
                .then_some(options.reference_images.as_slice()),
        };
        let response: ArkImageResponse = self
            .transport
            .post_json(&self.url, Auth::Bearer(&self.api_key), &request)
            .await?;
        let result = response.into_result(size.as_deref());
        debug!(completed = result.completed, job = ?result.task_id, "VolcEngine submission accepted");
        Ok(result)
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn poll(&self, task_id: &str) -> ReelforgeResult<ImageResult> {
        if task_id.is_empty() {
            return Err(ProviderError::new(ProviderErrorKind::Request(
                "empty job id".to_string(),
            ))
            .into());
        }
        let url = format!("{}/{}", self.url, task_id);
        let response: ArkImageResponse = self
            .transport
            .get_json(&url, Auth::Bearer(&self.api_key))
            .await?;
        Ok(response.into_result(None))
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
