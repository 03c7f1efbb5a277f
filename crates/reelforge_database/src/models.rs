//! Diesel row types and their conversions to domain records.

use crate::schema::{
    ai_provider_configs, characters, dramas, episodes, frame_prompts, generation_tasks,
    image_generations, scenes, storyboards,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use reelforge_core::{
    Character, Drama, Episode, FramePrompt, GenerationOptions, ImageGeneration, NewCharacter,
    NewFramePrompt, NewImageGeneration, ProviderConfig, Scene, ShotSpec, Storyboard, SubjectRef,
    Task, TaskId,
};
use reelforge_error::{DatabaseError, DatabaseErrorKind};
use std::str::FromStr;

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, DatabaseError> {
    value.parse().map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Serialization(format!(
            "unrecognized {column} value '{value}'"
        )))
    })
}

fn to_i32(value: Option<u32>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

fn to_u32(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = dramas, check_for_backend(diesel::pg::Pg))]
pub(crate) struct DramaRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
}

impl From<DramaRow> for Drama {
    fn from(row: DramaRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            genre: row.genre,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = episodes, check_for_backend(diesel::pg::Pg))]
pub(crate) struct EpisodeRow {
    pub id: i64,
    pub drama_id: i64,
    pub episode_number: i32,
    pub title: String,
    pub script_content: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: i32,
}

impl From<EpisodeRow> for Episode {
    fn from(row: EpisodeRow) -> Self {
        Self {
            id: row.id,
            drama_id: row.drama_id,
            episode_number: row.episode_number,
            title: row.title,
            script_content: row.script_content,
            description: row.description,
            duration_minutes: row.duration_minutes,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = characters, check_for_backend(diesel::pg::Pg))]
pub(crate) struct CharacterRow {
    pub id: i64,
    pub drama_id: i64,
    pub name: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub appearance: Option<String>,
    pub voice_style: Option<String>,
    pub image_url: Option<String>,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Self {
            id: row.id,
            drama_id: row.drama_id,
            name: row.name,
            role: row.role,
            description: row.description,
            personality: row.personality,
            appearance: row.appearance,
            voice_style: row.voice_style,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = characters)]
pub(crate) struct NewCharacterRow {
    pub drama_id: i64,
    pub name: String,
    pub role: Option<String>,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub appearance: Option<String>,
    pub voice_style: Option<String>,
}

impl NewCharacterRow {
    pub fn new(drama_id: i64, name: String, character: NewCharacter) -> Self {
        Self {
            drama_id,
            name,
            role: character.role,
            description: character.description,
            personality: character.personality,
            appearance: character.appearance,
            voice_style: character.voice_style,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = scenes, check_for_backend(diesel::pg::Pg))]
pub(crate) struct SceneRow {
    pub id: i64,
    pub drama_id: i64,
    pub episode_id: Option<i64>,
    pub location: String,
    pub time_of_day: String,
    pub prompt: String,
    pub storyboard_count: i32,
    pub status: String,
    pub image_url: Option<String>,
}

impl TryFrom<SceneRow> for Scene {
    type Error = DatabaseError;

    fn try_from(row: SceneRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            drama_id: row.drama_id,
            episode_id: row.episode_id,
            location: row.location,
            time: row.time_of_day,
            prompt: row.prompt,
            storyboard_count: row.storyboard_count,
            status: parse_column("scenes.status", &row.status)?,
            image_url: row.image_url,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = scenes)]
pub(crate) struct NewSceneRow {
    pub drama_id: i64,
    pub episode_id: Option<i64>,
    pub location: String,
    pub time_of_day: String,
    pub prompt: String,
    pub storyboard_count: i32,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = storyboards, check_for_backend(diesel::pg::Pg))]
pub(crate) struct StoryboardRow {
    pub id: i64,
    pub episode_id: i64,
    pub scene_id: Option<i64>,
    pub shot_number: i32,
    pub title: Option<String>,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub movement: Option<String>,
    pub action: Option<String>,
    pub dialogue: Option<String>,
    pub action_result: Option<String>,
    pub atmosphere: Option<String>,
    pub emotion: Option<String>,
    pub description: Option<String>,
    pub image_prompt: Option<String>,
    pub video_prompt: Option<String>,
    pub bgm_prompt: Option<String>,
    pub sound_effect: Option<String>,
    pub duration: i32,
    pub composed_image: Option<String>,
}

impl StoryboardRow {
    /// Combine the row with its linked character ids.
    pub fn into_storyboard(self, character_ids: Vec<i64>) -> Storyboard {
        Storyboard {
            id: self.id,
            episode_id: self.episode_id,
            composed_image: self.composed_image,
            shot: ShotSpec {
                scene_id: self.scene_id,
                shot_number: self.shot_number,
                title: self.title,
                location: self.location,
                time: self.time_of_day,
                shot_type: self.shot_type,
                angle: self.angle,
                movement: self.movement,
                action: self.action,
                dialogue: self.dialogue,
                result: self.action_result,
                atmosphere: self.atmosphere,
                emotion: self.emotion,
                description: self.description,
                image_prompt: self.image_prompt,
                video_prompt: self.video_prompt,
                bgm_prompt: self.bgm_prompt,
                sound_effect: self.sound_effect,
                duration: self.duration,
                character_ids,
            },
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = storyboards)]
pub(crate) struct NewStoryboardRow {
    pub episode_id: i64,
    pub scene_id: Option<i64>,
    pub shot_number: i32,
    pub title: Option<String>,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
    pub shot_type: Option<String>,
    pub angle: Option<String>,
    pub movement: Option<String>,
    pub action: Option<String>,
    pub dialogue: Option<String>,
    pub action_result: Option<String>,
    pub atmosphere: Option<String>,
    pub emotion: Option<String>,
    pub description: Option<String>,
    pub image_prompt: Option<String>,
    pub video_prompt: Option<String>,
    pub bgm_prompt: Option<String>,
    pub sound_effect: Option<String>,
    pub duration: i32,
}

impl NewStoryboardRow {
    pub fn new(episode_id: i64, shot: &ShotSpec) -> Self {
        Self {
            episode_id,
            scene_id: shot.scene_id,
            shot_number: shot.shot_number,
            title: shot.title.clone(),
            location: shot.location.clone(),
            time_of_day: shot.time.clone(),
            shot_type: shot.shot_type.clone(),
            angle: shot.angle.clone(),
            movement: shot.movement.clone(),
            action: shot.action.clone(),
            dialogue: shot.dialogue.clone(),
            action_result: shot.result.clone(),
            atmosphere: shot.atmosphere.clone(),
            emotion: shot.emotion.clone(),
            description: shot.description.clone(),
            image_prompt: shot.image_prompt.clone(),
            video_prompt: shot.video_prompt.clone(),
            bgm_prompt: shot.bgm_prompt.clone(),
            sound_effect: shot.sound_effect.clone(),
            duration: shot.duration,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = frame_prompts, check_for_backend(diesel::pg::Pg))]
pub(crate) struct FramePromptRow {
    pub id: i64,
    pub storyboard_id: i64,
    pub frame_type: String,
    pub prompt: String,
    pub description: Option<String>,
    pub layout: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FramePromptRow> for FramePrompt {
    type Error = DatabaseError;

    fn try_from(row: FramePromptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            storyboard_id: row.storyboard_id,
            frame_type: parse_column("frame_prompts.frame_type", &row.frame_type)?,
            prompt: row.prompt,
            description: row.description,
            layout: row.layout,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = frame_prompts)]
pub(crate) struct NewFramePromptRow {
    pub storyboard_id: i64,
    pub frame_type: String,
    pub prompt: String,
    pub description: Option<String>,
    pub layout: Option<String>,
}

impl From<NewFramePrompt> for NewFramePromptRow {
    fn from(prompt: NewFramePrompt) -> Self {
        Self {
            storyboard_id: prompt.storyboard_id,
            frame_type: prompt.frame_type.to_string(),
            prompt: prompt.prompt,
            description: prompt.description,
            layout: prompt.layout,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = image_generations, check_for_backend(diesel::pg::Pg))]
pub(crate) struct ImageGenerationRow {
    pub id: i64,
    pub drama_id: i64,
    pub target_kind: Option<String>,
    pub target_id: Option<i64>,
    pub image_type: String,
    pub frame_type: Option<String>,
    pub provider: String,
    pub model: Option<String>,
    pub prompt: String,
    pub options: serde_json::Value,
    pub status: String,
    pub provider_task_id: Option<String>,
    pub image_url: Option<String>,
    pub local_path: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ImageGenerationRow> for ImageGeneration {
    type Error = DatabaseError;

    fn try_from(row: ImageGenerationRow) -> Result<Self, Self::Error> {
        let target = match (row.target_kind.as_deref(), row.target_id) {
            (Some(kind), Some(id)) => Some(SubjectRef::new(
                parse_column("image_generations.target_kind", kind)?,
                id,
            )),
            _ => None,
        };
        let frame_type = row
            .frame_type
            .as_deref()
            .map(|value| parse_column("image_generations.frame_type", value))
            .transpose()?;
        let options: GenerationOptions = serde_json::from_value(row.options)?;

        Ok(Self {
            id: row.id,
            drama_id: row.drama_id,
            target,
            image_type: parse_column("image_generations.image_type", &row.image_type)?,
            frame_type,
            provider: row.provider,
            model: row.model,
            prompt: row.prompt,
            options,
            status: parse_column("image_generations.status", &row.status)?,
            provider_task_id: row.provider_task_id,
            image_url: row.image_url,
            local_path: row.local_path,
            width: to_u32(row.width),
            height: to_u32(row.height),
            error_message: row.error_message,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = image_generations)]
pub(crate) struct NewImageGenerationRow {
    pub drama_id: i64,
    pub target_kind: Option<String>,
    pub target_id: Option<i64>,
    pub image_type: String,
    pub frame_type: Option<String>,
    pub provider: String,
    pub model: Option<String>,
    pub prompt: String,
    pub options: serde_json::Value,
    pub status: String,
}

impl TryFrom<NewImageGeneration> for NewImageGenerationRow {
    type Error = DatabaseError;

    fn try_from(record: NewImageGeneration) -> Result<Self, Self::Error> {
        Ok(Self {
            drama_id: record.drama_id,
            target_kind: record.target.map(|t| t.kind.to_string()),
            target_id: record.target.map(|t| t.id),
            image_type: record.image_type.to_string(),
            frame_type: record.frame_type.map(|f| f.to_string()),
            provider: record.provider,
            model: record.model,
            prompt: record.prompt,
            options: serde_json::to_value(&record.options)?,
            status: reelforge_core::ImageStatus::Pending.to_string(),
        })
    }
}

/// Column values written when an image completes.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = image_generations)]
pub(crate) struct ImageCompletionChangeset {
    pub status: String,
    pub image_url: Option<String>,
    pub local_path: Option<Option<String>>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub error_message: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImageCompletionChangeset {
    pub fn new(completion: &reelforge_core::ImageCompletion) -> Self {
        Self {
            status: reelforge_core::ImageStatus::Completed.to_string(),
            image_url: Some(completion.image_url.clone()),
            local_path: Some(completion.local_path.clone()),
            width: to_i32(completion.width),
            height: to_i32(completion.height),
            error_message: Some(None),
            completed_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = generation_tasks, check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TaskRow {
    pub id: uuid::Uuid,
    pub task_type: String,
    pub subject_kind: String,
    pub subject_id: i64,
    pub status: String,
    pub progress: i16,
    pub message: String,
    pub result_json: Option<serde_json::Value>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: *task.id.as_uuid(),
            task_type: task.task_type.to_string(),
            subject_kind: task.subject.kind.to_string(),
            subject_id: task.subject.id,
            status: task.status.to_string(),
            progress: i16::from(task.progress),
            message: task.message.clone(),
            result_json: task.result.clone(),
            error_detail: task.error.clone(),
            created_at: task.created_at,
            updated_at: task.updated_at,
            completed_at: task.completed_at,
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TaskId::from_uuid(row.id),
            task_type: parse_column("generation_tasks.task_type", &row.task_type)?,
            subject: SubjectRef::new(
                parse_column("generation_tasks.subject_kind", &row.subject_kind)?,
                row.subject_id,
            ),
            status: parse_column("generation_tasks.status", &row.status)?,
            progress: u8::try_from(row.progress.clamp(0, 100)).unwrap_or(100),
            message: row.message,
            result: row.result_json,
            error: row.error_detail,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = ai_provider_configs, check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProviderConfigRow {
    pub id: i64,
    pub name: String,
    pub provider: String,
    pub base_url: String,
    pub api_key: String,
    pub models: serde_json::Value,
    pub capability: String,
    pub is_default: bool,
    pub priority: i32,
    pub is_active: bool,
}

impl TryFrom<ProviderConfigRow> for ProviderConfig {
    type Error = DatabaseError;

    fn try_from(row: ProviderConfigRow) -> Result<Self, Self::Error> {
        let models: Vec<String> = serde_json::from_value(row.models)?;
        tracing::trace!(config_id = row.id, name = %row.name, "Loaded provider config");
        ProviderConfig::builder()
            .name(row.name)
            .provider(row.provider)
            .base_url(row.base_url)
            .api_key(row.api_key)
            .models(models)
            .capability(parse_column::<reelforge_core::Capability>(
                "ai_provider_configs.capability",
                &row.capability,
            )?)
            .is_default(row.is_default)
            .priority(row.priority)
            .is_active(row.is_active)
            .build()
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Serialization(e.to_string())))
    }
}
