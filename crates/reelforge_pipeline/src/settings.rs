//! Tunables shared by the orchestrators.

use reelforge_tasks::PollConfig;

/// Generation defaults and limits.
///
/// # Examples
///
/// ```
/// use reelforge_pipeline::PipelineSettings;
///
/// let settings = PipelineSettings::builder()
///     .video_ratio("9:16")
///     .build()
///     .unwrap();
/// assert_eq!(settings.storyboard_max_tokens, 16000);
/// assert_eq!(settings.video_ratio.as_deref(), Some("9:16"));
/// ```
#[derive(Debug, Clone, PartialEq, derive_builder::Builder)]
#[builder(default)]
pub struct PipelineSettings {
    /// Output token limit for storyboard decomposition
    pub storyboard_max_tokens: u32,
    /// Sampling temperature for character generation
    pub character_temperature: f32,
    /// Characters generated when the request names no count
    pub default_character_count: u32,
    /// Upper bound on requested character count
    pub max_character_count: u32,
    /// Sampling temperature for background extraction
    pub background_temperature: f32,
    /// Style appended to derived video prompts
    #[builder(setter(into, strip_option))]
    pub video_style: Option<String>,
    /// Aspect ratio appended to derived video prompts
    #[builder(setter(into, strip_option))]
    pub video_ratio: Option<String>,
    /// Provider family recorded when an image request names none
    #[builder(setter(into))]
    pub default_image_provider: String,
    /// Poll cadence for asynchronous image jobs
    pub poll: PollConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            storyboard_max_tokens: 16000,
            character_temperature: 0.7,
            default_character_count: 5,
            max_character_count: 50,
            background_temperature: 0.7,
            video_style: None,
            video_ratio: None,
            default_image_provider: "openai".to_string(),
            poll: PollConfig::default(),
        }
    }
}

impl PipelineSettings {
    /// Creates a new settings builder.
    pub fn builder() -> PipelineSettingsBuilder {
        PipelineSettingsBuilder::default()
    }
}
