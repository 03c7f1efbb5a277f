use reelforge_core::{Capability, ProviderConfig};
use reelforge_error::{ProviderErrorKind, ReelforgeErrorKind};
use reelforge_interface::ProviderResolver;
use reelforge_models::{HttpTransport, ProviderRegistry, RetryPolicy, StaticProviderConfigs};
use std::sync::Arc;
use std::time::Duration;

fn config(name: &str, provider: &str, capability: Capability, models: &[&str]) -> ProviderConfig {
    ProviderConfig::builder()
        .name(name)
        .provider(provider)
        .base_url("https://provider.invalid/v1")
        .api_key("test-key")
        .capability(capability)
        .models(models.iter().map(|m| m.to_string()).collect::<Vec<_>>())
        .build()
        .unwrap()
}

fn registry(configs: Vec<ProviderConfig>) -> ProviderRegistry {
    let transport = HttpTransport::new(Duration::from_secs(1), RetryPolicy::none()).unwrap();
    ProviderRegistry::new(Arc::new(StaticProviderConfigs::new(configs)), transport)
}

#[tokio::test]
async fn known_model_resolves_to_its_config() {
    let registry = registry(vec![
        config("text-default", "openai", Capability::Text, &["gpt-4o-mini"]),
        config("gemini-text", "gemini", Capability::Text, &["gemini-2.5-pro"]),
    ]);
    let resolved = registry
        .resolve_config(Capability::Text, Some("gemini-2.5-pro"))
        .await
        .unwrap();
    assert_eq!(resolved.name(), "gemini-text");

    let client = registry.text_generator(Some("gemini-2.5-pro")).await.unwrap();
    assert_eq!(client.provider_name(), "gemini");
    assert_eq!(client.model_name(), "gemini-2.5-pro");
}

#[tokio::test]
async fn unknown_model_falls_back_to_default() {
    let mut fallback = ProviderConfig::builder()
        .name("image-default")
        .provider("doubao")
        .base_url("https://ark.invalid/api/v3")
        .api_key("k")
        .capability(Capability::Image)
        .models(vec!["seedream-4".to_string()])
        .is_default(true)
        .build()
        .unwrap();
    let other = config("dalle", "openai", Capability::Image, &["dall-e-3"]);
    let registry = registry(vec![other, fallback.clone()]);

    let client = registry.image_generator(Some("no-such-model")).await.unwrap();
    assert_eq!(client.provider_name(), "doubao");
    assert_eq!(client.model_name(), "seedream-4");

    fallback = registry
        .resolve_config(Capability::Image, None)
        .await
        .unwrap();
    assert_eq!(fallback.name(), "image-default");
}

#[tokio::test]
async fn missing_default_is_reported() {
    let registry = registry(vec![config("text", "openai", Capability::Text, &["gpt-4o"])]);
    let err = match registry.image_generator(Some("dall-e-3")).await {
        Ok(_) => panic!("expected no image provider"),
        Err(e) => e,
    };
    match err.kind() {
        ReelforgeErrorKind::Provider(e) => assert_eq!(
            e.kind,
            ProviderErrorKind::NoProviderConfigured("image".to_string())
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn inactive_configs_are_ignored() {
    let inactive = ProviderConfig::builder()
        .name("off")
        .provider("openai")
        .base_url("https://x.invalid")
        .api_key("k")
        .capability(Capability::Text)
        .models(vec!["gpt-4o".to_string()])
        .is_default(true)
        .is_active(false)
        .build()
        .unwrap();
    let registry = registry(vec![inactive]);
    assert!(registry.text_generator(Some("gpt-4o")).await.is_err());
}
