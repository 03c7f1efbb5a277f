//! Configuration layering and provider key resolution.

use reelforge::{Capability, ReelforgeConfig};
use std::time::Duration;

const PROVIDERS: &str = r#"
[[providers]]
name = "openai-text"
provider = "openai"
base_url = "https://api.openai.com/v1"
api_key_env = "TEST_OPENAI_KEY"
models = ["gpt-4o-mini", "gpt-4o"]
capability = "text"
is_default = true

[[providers]]
name = "doubao-image"
provider = "volcengine"
base_url = "https://ark.cn-beijing.volces.com/api/v3"
api_key_env = "TEST_ARK_KEY"
capability = "image"
priority = 2

[polling]
interval_secs = 2

[generation]
video_ratio = "9:16"
"#;

#[test]
fn bundled_defaults_parse() {
    let config = ReelforgeConfig::from_toml_str("").unwrap();

    assert!(config.providers.is_empty());
    assert_eq!(config.polling.max_attempts, 60);
    assert_eq!(config.executor.queue_depth, 64);
    assert_eq!(config.generation.storyboard_max_tokens, 16000);
    assert_eq!(config.generation.default_image_provider, "openai");
    assert_eq!(config.http.timeout_secs, 120);
    assert!(config.storage.cache_dir.is_none());
    assert!(config.storage.database_url.is_none());
}

#[test]
fn storage_section_reads_database_url() {
    let config = ReelforgeConfig::from_toml_str(
        r#"
[storage]
database_url = "postgres://reelforge@localhost/reelforge"
"#,
    )
    .unwrap();

    assert_eq!(
        config.storage.database_url.as_deref(),
        Some("postgres://reelforge@localhost/reelforge")
    );
    assert!(config.storage.cache_dir.is_none());
}

#[test]
fn overrides_merge_with_defaults() {
    let config = ReelforgeConfig::from_toml_str(PROVIDERS).unwrap();

    let poll = config.poll_config();
    assert_eq!(poll.interval, Duration::from_secs(2));
    assert_eq!(poll.max_attempts, 60);

    let settings = config.pipeline_settings();
    assert_eq!(settings.video_ratio.as_deref(), Some("9:16"));
    assert_eq!(settings.default_character_count, 5);
    assert_eq!(settings.poll, poll);
}

#[test]
fn providers_without_keys_are_skipped() {
    let config = ReelforgeConfig::from_toml_str(PROVIDERS).unwrap();

    let configs = config
        .provider_configs_with(|var| (var == "TEST_OPENAI_KEY").then(|| "sk-test".to_string()))
        .unwrap();

    assert_eq!(configs.len(), 1);
    let text = &configs[0];
    assert_eq!(text.name(), "openai-text");
    assert_eq!(text.api_key(), "sk-test");
    assert_eq!(*text.capability(), Capability::Text);
    assert!(*text.is_default());
    assert!(*text.is_active());
    assert_eq!(text.default_model(), Some("gpt-4o-mini"));
}

#[test]
fn empty_key_counts_as_missing() {
    let config = ReelforgeConfig::from_toml_str(PROVIDERS).unwrap();

    let configs = config
        .provider_configs_with(|_| Some("  ".to_string()))
        .unwrap();

    assert!(configs.is_empty());
}
