//! Provider family detection and endpoint paths.

use serde::{Deserialize, Serialize};

/// Provider families with distinct wire protocols.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI and resellers speaking its dialect (openai, dalle, chatfire)
    OpenAi,
    /// VolcEngine Ark (volcengine, volces, doubao); images may be asynchronous
    VolcEngine,
    /// Google Gemini (gemini, google)
    Gemini,
    /// Anything else, treated as OpenAI-compatible
    OpenAiCompatible,
}

impl ProviderKind {
    /// Map a configured provider name to its family. Matching ignores case.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelforge_models::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::from_name("doubao"), ProviderKind::VolcEngine);
    /// assert_eq!(ProviderKind::from_name("Google"), ProviderKind::Gemini);
    /// assert_eq!(ProviderKind::from_name("my-proxy"), ProviderKind::OpenAiCompatible);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" | "dalle" | "chatfire" => Self::OpenAi,
            "volcengine" | "volces" | "doubao" => Self::VolcEngine,
            "gemini" | "google" => Self::Gemini,
            _ => Self::OpenAiCompatible,
        }
    }

    /// Path of the text generation endpoint for `model`.
    pub fn text_endpoint(self, model: &str) -> String {
        match self {
            Self::Gemini => gemini_endpoint(model),
            _ => "/chat/completions".to_string(),
        }
    }

    /// Path of the image generation endpoint for `model`.
    pub fn image_endpoint(self, model: &str) -> String {
        match self {
            Self::Gemini => gemini_endpoint(model),
            _ => "/images/generations".to_string(),
        }
    }
}

fn gemini_endpoint(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

/// Join a base URL and an endpoint path without doubling slashes.
pub(crate) fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_share_a_family() {
        for name in ["openai", "dalle", "chatfire"] {
            assert_eq!(ProviderKind::from_name(name), ProviderKind::OpenAi);
        }
        for name in ["volcengine", "volces", "doubao"] {
            assert_eq!(ProviderKind::from_name(name), ProviderKind::VolcEngine);
        }
    }

    #[test]
    fn endpoints_follow_family() {
        assert_eq!(
            ProviderKind::Gemini.image_endpoint("gemini-2.5-flash-image"),
            "/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(ProviderKind::OpenAi.image_endpoint("dall-e-3"), "/images/generations");
        assert_eq!(ProviderKind::OpenAiCompatible.text_endpoint("x"), "/chat/completions");
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(
            join_url("https://api.example.com/v1/", "/images/generations"),
            "https://api.example.com/v1/images/generations"
        );
    }
}
