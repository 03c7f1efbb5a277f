//! Persistence traits.
//!
//! Implementations may be in-memory or database backed. Every method that
//! writes more than one record must apply all of its writes or none.

use async_trait::async_trait;
use reelforge_core::{
    Capability, Character, Drama, Episode, FramePrompt, ImageCompletion, ImageGeneration,
    NewCharacter, NewFramePrompt, NewImageGeneration, NewScene, ProviderConfig, Scene, ShotSpec,
    Storyboard, SubjectRef, Task, TaskId,
};
use reelforge_error::ReelforgeResult;

/// Storage for generation tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task.
    async fn insert_task(&self, task: &Task) -> ReelforgeResult<()>;

    /// Overwrite an existing task.
    async fn update_task(&self, task: &Task) -> ReelforgeResult<()>;

    /// Load a task by id.
    async fn get_task(&self, id: &TaskId) -> ReelforgeResult<Option<Task>>;

    /// Tasks about one subject, newest first.
    async fn list_tasks(&self, subject: &SubjectRef) -> ReelforgeResult<Vec<Task>>;
}

/// Source of provider configurations.
#[async_trait]
pub trait ProviderConfigStore: Send + Sync {
    /// Active configuration of `capability` that lists `model`.
    async fn find_by_model(
        &self,
        capability: Capability,
        model: &str,
    ) -> ReelforgeResult<Option<ProviderConfig>>;

    /// Default active configuration for `capability`.
    async fn default_for(&self, capability: Capability) -> ReelforgeResult<Option<ProviderConfig>>;
}

/// Storage for dramas and everything generated for them.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Load a drama.
    async fn get_drama(&self, id: i64) -> ReelforgeResult<Option<Drama>>;

    /// Load an episode.
    async fn get_episode(&self, id: i64) -> ReelforgeResult<Option<Episode>>;

    /// Load a character.
    async fn get_character(&self, id: i64) -> ReelforgeResult<Option<Character>>;

    /// Load a scene.
    async fn get_scene(&self, id: i64) -> ReelforgeResult<Option<Scene>>;

    /// Load a storyboard shot.
    async fn get_storyboard(&self, id: i64) -> ReelforgeResult<Option<Storyboard>>;

    /// Characters of a drama, by id.
    async fn list_characters(&self, drama_id: i64) -> ReelforgeResult<Vec<Character>>;

    /// Scenes extracted for an episode, by id.
    async fn list_scenes(&self, episode_id: i64) -> ReelforgeResult<Vec<Scene>>;

    /// Shots of an episode, by shot number.
    async fn list_storyboards(&self, episode_id: i64) -> ReelforgeResult<Vec<Storyboard>>;

    /// Replace all shots of an episode.
    ///
    /// In one transaction: verifies the episode, detaches image generation
    /// records from the old shots, deletes them, inserts `shots` and links
    /// each new shot to the listed characters that exist. An empty batch is
    /// rejected before anything is touched.
    async fn replace_storyboards(
        &self,
        episode_id: i64,
        shots: Vec<ShotSpec>,
    ) -> ReelforgeResult<Vec<Storyboard>>;

    /// Replace all scenes extracted for an episode, atomically.
    ///
    /// New scenes start in `pending` status. An empty batch is rejected.
    async fn replace_scenes(
        &self,
        episode_id: i64,
        scenes: Vec<NewScene>,
    ) -> ReelforgeResult<Vec<Scene>>;

    /// Store an episode's runtime in minutes.
    async fn set_episode_duration(&self, episode_id: i64, minutes: i32) -> ReelforgeResult<()>;

    /// Insert characters into a drama, reusing existing ones with the same name.
    ///
    /// When `episode_id` is given the characters are associated with that
    /// episode in the same transaction.
    async fn upsert_characters(
        &self,
        drama_id: i64,
        episode_id: Option<i64>,
        characters: Vec<NewCharacter>,
    ) -> ReelforgeResult<Vec<Character>>;

    /// Store a frame prompt, replacing any prior one for the same shot and frame type.
    async fn save_frame_prompt(&self, prompt: NewFramePrompt) -> ReelforgeResult<FramePrompt>;

    /// Frame prompts of a shot.
    async fn list_frame_prompts(&self, storyboard_id: i64) -> ReelforgeResult<Vec<FramePrompt>>;
}

/// Storage for image generation records.
#[async_trait]
pub trait ImageGenerationRepository: Send + Sync {
    /// Persist a new record in `pending` status.
    async fn create_image_generation(
        &self,
        record: NewImageGeneration,
    ) -> ReelforgeResult<ImageGeneration>;

    /// Load a record.
    async fn get_image_generation(&self, id: i64) -> ReelforgeResult<Option<ImageGeneration>>;

    /// Records of a drama, newest first.
    async fn list_image_generations(&self, drama_id: i64) -> ReelforgeResult<Vec<ImageGeneration>>;

    /// Delete a record; returns whether it existed.
    async fn delete_image_generation(&self, id: i64) -> ReelforgeResult<bool>;

    /// Move a record to `processing`, storing the provider job token when given.
    ///
    /// A scene target is marked `generating`.
    async fn mark_image_processing(
        &self,
        id: i64,
        provider_task_id: Option<String>,
    ) -> ReelforgeResult<()>;

    /// Complete a record and copy the image onto its target.
    ///
    /// Storyboard targets get `composed_image`; scene targets of a scene image
    /// get `image_url` and `generated` status; character targets get `image_url`.
    async fn complete_image_generation(
        &self,
        id: i64,
        completion: ImageCompletion,
    ) -> ReelforgeResult<ImageGeneration>;

    /// Fail a record; a scene target is marked `failed`.
    async fn fail_image_generation(&self, id: i64, message: &str) -> ReelforgeResult<()>;
}
