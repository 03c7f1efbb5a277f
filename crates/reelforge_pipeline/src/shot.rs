//! Shots as returned by the storyboard model, and the fields derived from them.

use crate::prompts::non_empty;
use reelforge_core::ShotSpec;
use serde::Deserialize;

/// Words that mark the start of motion within an action description.
///
/// Checked in this order; the first one found past the start of the text
/// ends the initial pose.
const PROCESS_WORDS: [&str; 18] = [
    "然后", "接着", "接下来", "随后", "紧接着", "向下", "向上", "向前", "向后", "向左", "向右",
    "开始", "继续", "逐渐", "慢慢", "快速", "突然", "猛然",
];

/// Longest duration kept for a single shot, in seconds.
pub const MAX_SHOT_SECONDS: i32 = 600;

/// One shot in the storyboard model's answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratedShot {
    /// Position within the episode; missing or zero means "use list order"
    pub shot_number: Option<i32>,
    /// Scene the model placed the shot in
    pub scene_id: Option<i64>,
    /// Short title
    pub title: String,
    /// Shot size
    pub shot_type: String,
    /// Camera angle
    pub angle: String,
    /// Time of day
    pub time: String,
    /// Location
    pub location: String,
    /// Camera movement
    pub movement: String,
    /// Action
    pub action: String,
    /// Spoken line
    pub dialogue: String,
    /// Visible result
    pub result: String,
    /// Atmosphere
    pub atmosphere: String,
    /// Audience emotion
    pub emotion: String,
    /// Seconds
    pub duration: i32,
    /// Music prompt
    pub bgm_prompt: String,
    /// Sound effects
    pub sound_effect: String,
    /// Character ids appearing in the shot
    #[serde(alias = "character_ids")]
    pub characters: Vec<i64>,
    /// Whether the shot carries the main beat of its scene
    pub is_primary: bool,
}

/// Style appended to derived video prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoStyle<'a> {
    /// Visual style
    pub style: Option<&'a str>,
    /// Aspect ratio
    pub ratio: Option<&'a str>,
}

impl GeneratedShot {
    /// Convert into a persistable shot at list position `index`.
    ///
    /// Empty text fields become absent and the description, image prompt
    /// and video prompt are derived from the rest. The duration is clamped
    /// to `0..=MAX_SHOT_SECONDS`.
    pub fn into_spec(self, index: usize, video: VideoStyle<'_>) -> ShotSpec {
        let shot_number = self
            .shot_number
            .filter(|n| *n > 0)
            .unwrap_or(index as i32 + 1);
        let description = compose_description(&self);
        let image_prompt = image_prompt(&self);
        let video_prompt = video_prompt(&self, video);

        ShotSpec {
            scene_id: self.scene_id,
            shot_number,
            title: text(self.title),
            location: text(self.location),
            time: text(self.time),
            shot_type: text(self.shot_type),
            angle: text(self.angle),
            movement: text(self.movement),
            action: text(self.action),
            dialogue: text(self.dialogue),
            result: text(self.result),
            atmosphere: text(self.atmosphere),
            emotion: text(self.emotion),
            description: Some(description),
            image_prompt: Some(image_prompt),
            video_prompt: text(video_prompt),
            bgm_prompt: text(self.bgm_prompt),
            sound_effect: text(self.sound_effect),
            duration: self.duration.clamp(0, MAX_SHOT_SECONDS),
            character_ids: self.characters,
        }
    }
}

fn text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Labeled multi-line description stored with the shot.
pub fn compose_description(shot: &GeneratedShot) -> String {
    format!(
        "【镜头类型】{}\n【运镜】{}\n【动作】{}\n【对话】{}\n【结果】{}\n【情绪】{}",
        shot.shot_type, shot.movement, shot.action, shot.dialogue, shot.result, shot.emotion
    )
}

/// The pose before any motion: `action` cut at the first motion word.
///
/// # Examples
///
/// ```
/// use reelforge_pipeline::initial_pose;
///
/// assert_eq!(initial_pose("他站在门口，然后转身离开"), "他站在门口");
/// assert_eq!(initial_pose("静静坐着"), "静静坐着");
/// ```
pub fn initial_pose(action: &str) -> &str {
    let cut = PROCESS_WORDS
        .iter()
        .find_map(|word| action.find(word).filter(|idx| *idx > 0))
        .unwrap_or(action.len());
    action[..cut].trim_end_matches(|c: char| matches!(c, '，' | '。' | ',' | '.') || c.is_whitespace())
}

/// Prompt for the shot's first frame.
pub fn image_prompt(shot: &GeneratedShot) -> String {
    let mut parts = Vec::new();

    if let Some(location) = non_empty(Some(&shot.location)) {
        match non_empty(Some(&shot.time)) {
            Some(time) => parts.push(format!("{location}, {time}")),
            None => parts.push(location.to_string()),
        }
    }
    let pose = initial_pose(shot.action.trim());
    if !pose.is_empty() {
        parts.push(pose.to_string());
    }
    if let Some(emotion) = non_empty(Some(&shot.emotion)) {
        parts.push(emotion.to_string());
    }
    parts.push("anime style, first frame".to_string());

    parts.join(", ")
}

/// Prompt for video generation from the shot.
pub fn video_prompt(shot: &GeneratedShot, video: VideoStyle<'_>) -> String {
    let mut parts = Vec::new();
    let labeled = [
        ("Action", shot.action.as_str()),
        ("Dialogue", shot.dialogue.as_str()),
        ("Camera movement", shot.movement.as_str()),
        ("Shot type", shot.shot_type.as_str()),
        ("Camera angle", shot.angle.as_str()),
    ];
    for (label, value) in labeled {
        if let Some(value) = non_empty(Some(value)) {
            parts.push(format!("{label}: {value}"));
        }
    }

    if let Some(location) = non_empty(Some(&shot.location)) {
        match non_empty(Some(&shot.time)) {
            Some(time) => parts.push(format!("Scene: {location}, {time}")),
            None => parts.push(format!("Scene: {location}")),
        }
    }

    let labeled = [
        ("Atmosphere", shot.atmosphere.as_str()),
        ("Mood", shot.emotion.as_str()),
        ("Result", shot.result.as_str()),
        ("BGM", shot.bgm_prompt.as_str()),
        ("Sound effects", shot.sound_effect.as_str()),
    ];
    for (label, value) in labeled {
        if let Some(value) = non_empty(Some(value)) {
            parts.push(format!("{label}: {value}"));
        }
    }

    if let Some(style) = non_empty(video.style) {
        parts.push(format!("Style: {style}"));
    }
    if let Some(ratio) = non_empty(video.ratio) {
        parts.push(format!("=VideoRatio: {ratio}"));
    }

    parts.join(". ")
}
