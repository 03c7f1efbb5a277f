//! In-process store with transactional multi-record writes.

use crate::StoreSnapshot;
use async_trait::async_trait;
use chrono::Utc;
use reelforge_core::{
    Character, Drama, Episode, FramePrompt, ImageCompletion, ImageGeneration, ImageStatus,
    ImageType, NewCharacter, NewFramePrompt, NewImageGeneration, NewScene, Scene, SceneStatus,
    ShotSpec, Storyboard, SubjectKind,
};
use reelforge_error::{
    DatabaseError, DatabaseErrorKind, PipelineError, PipelineErrorKind, ReelforgeResult,
};
use reelforge_interface::{ImageGenerationRepository, StoryRepository};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
struct State {
    dramas: BTreeMap<i64, Drama>,
    episodes: BTreeMap<i64, Episode>,
    characters: BTreeMap<i64, Character>,
    episode_characters: BTreeSet<(i64, i64)>,
    scenes: BTreeMap<i64, Scene>,
    storyboards: BTreeMap<i64, Storyboard>,
    frame_prompts: BTreeMap<i64, FramePrompt>,
    image_generations: BTreeMap<i64, ImageGeneration>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn episode(&self, id: i64) -> ReelforgeResult<&Episode> {
        self.episodes
            .get(&id)
            .ok_or_else(|| PipelineError::not_found("episode", id).into())
    }

    fn image_generation(&mut self, id: i64) -> ReelforgeResult<&mut ImageGeneration> {
        self.image_generations.get_mut(&id).ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::NotFound(format!("image generation {id}")))
                .into()
        })
    }

    /// Clear image-generation targets pointing at removed records.
    fn detach_images(&mut self, kind: SubjectKind, removed: &BTreeSet<i64>) -> usize {
        let mut detached = 0;
        for record in self.image_generations.values_mut() {
            if record
                .target
                .is_some_and(|t| t.kind == kind && removed.contains(&t.id))
            {
                record.target = None;
                detached += 1;
            }
        }
        detached
    }

    fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut state = Self {
            dramas: snapshot.dramas.into_iter().map(|r| (r.id, r)).collect(),
            episodes: snapshot.episodes.into_iter().map(|r| (r.id, r)).collect(),
            characters: snapshot.characters.into_iter().map(|r| (r.id, r)).collect(),
            episode_characters: snapshot.episode_characters.into_iter().collect(),
            scenes: snapshot.scenes.into_iter().map(|r| (r.id, r)).collect(),
            storyboards: snapshot.storyboards.into_iter().map(|r| (r.id, r)).collect(),
            frame_prompts: snapshot.frame_prompts.into_iter().map(|r| (r.id, r)).collect(),
            image_generations: snapshot
                .image_generations
                .into_iter()
                .map(|r| (r.id, r))
                .collect(),
            last_id: 0,
        };
        state.last_id = [
            state.dramas.keys().max(),
            state.episodes.keys().max(),
            state.characters.keys().max(),
            state.scenes.keys().max(),
            state.storyboards.keys().max(),
            state.frame_prompts.keys().max(),
            state.image_generations.keys().max(),
        ]
        .into_iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0);
        state
    }

    fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            dramas: self.dramas.values().cloned().collect(),
            episodes: self.episodes.values().cloned().collect(),
            characters: self.characters.values().cloned().collect(),
            episode_characters: self.episode_characters.iter().copied().collect(),
            scenes: self.scenes.values().cloned().collect(),
            storyboards: self.storyboards.values().cloned().collect(),
            frame_prompts: self.frame_prompts.values().cloned().collect(),
            image_generations: self.image_generations.values().cloned().collect(),
        }
    }
}

/// Scene whose status a scene-type image settles.
fn scene_target(record: &ImageGeneration) -> Option<i64> {
    record
        .target
        .filter(|t| t.kind == SubjectKind::Scene && record.image_type == ImageType::Scene)
        .map(|t| t.id)
}

/// Story and image-generation store held in memory.
///
/// Multi-record writes run against a copy of the state that replaces the
/// original only when every step succeeded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the records of `snapshot`.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::from_snapshot(snapshot))),
        }
    }

    /// Copy of every record.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.to_snapshot()
    }

    async fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&*self.state.read().await)
    }

    async fn transaction<T>(
        &self,
        f: impl FnOnce(&mut State) -> ReelforgeResult<T>,
    ) -> ReelforgeResult<T> {
        let mut guard = self.state.write().await;
        let mut draft = guard.clone();
        let value = f(&mut draft)?;
        *guard = draft;
        Ok(value)
    }
}

#[async_trait]
impl StoryRepository for InMemoryStore {
    async fn get_drama(&self, id: i64) -> ReelforgeResult<Option<Drama>> {
        Ok(self.read(|s| s.dramas.get(&id).cloned()).await)
    }

    async fn get_episode(&self, id: i64) -> ReelforgeResult<Option<Episode>> {
        Ok(self.read(|s| s.episodes.get(&id).cloned()).await)
    }

    async fn get_character(&self, id: i64) -> ReelforgeResult<Option<Character>> {
        Ok(self.read(|s| s.characters.get(&id).cloned()).await)
    }

    async fn get_scene(&self, id: i64) -> ReelforgeResult<Option<Scene>> {
        Ok(self.read(|s| s.scenes.get(&id).cloned()).await)
    }

    async fn get_storyboard(&self, id: i64) -> ReelforgeResult<Option<Storyboard>> {
        Ok(self.read(|s| s.storyboards.get(&id).cloned()).await)
    }

    async fn list_characters(&self, drama_id: i64) -> ReelforgeResult<Vec<Character>> {
        Ok(self
            .read(|s| {
                s.characters
                    .values()
                    .filter(|c| c.drama_id == drama_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn list_scenes(&self, episode_id: i64) -> ReelforgeResult<Vec<Scene>> {
        Ok(self
            .read(|s| {
                s.scenes
                    .values()
                    .filter(|scene| scene.episode_id == Some(episode_id))
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn list_storyboards(&self, episode_id: i64) -> ReelforgeResult<Vec<Storyboard>> {
        let mut shots: Vec<Storyboard> = self
            .read(|s| {
                s.storyboards
                    .values()
                    .filter(|sb| sb.episode_id == episode_id)
                    .cloned()
                    .collect()
            })
            .await;
        shots.sort_by_key(|sb| (sb.shot.shot_number, sb.id));
        Ok(shots)
    }

    #[instrument(skip(self, shots), fields(count = shots.len()))]
    async fn replace_storyboards(
        &self,
        episode_id: i64,
        shots: Vec<ShotSpec>,
    ) -> ReelforgeResult<Vec<Storyboard>> {
        if shots.is_empty() {
            return Err(
                PipelineError::new(PipelineErrorKind::EmptyResult("storyboards".into())).into(),
            );
        }

        self.transaction(|s| {
            let drama_id = s.episode(episode_id)?.drama_id;

            let old: BTreeSet<i64> = s
                .storyboards
                .values()
                .filter(|sb| sb.episode_id == episode_id)
                .map(|sb| sb.id)
                .collect();
            let detached = s.detach_images(SubjectKind::Storyboard, &old);
            s.storyboards.retain(|id, _| !old.contains(id));
            s.frame_prompts.retain(|_, fp| !old.contains(&fp.storyboard_id));
            debug!(removed = old.len(), detached, "Cleared previous storyboards");

            let mut created = Vec::with_capacity(shots.len());
            for mut shot in shots {
                if let Some(scene_id) = shot.scene_id.filter(|id| !s.scenes.contains_key(id)) {
                    return Err(DatabaseError::new(DatabaseErrorKind::Conflict(format!(
                        "shot {} references missing scene {}",
                        shot.shot_number, scene_id
                    )))
                    .into());
                }
                shot.character_ids.retain(|id| {
                    s.characters
                        .get(id)
                        .is_some_and(|c| c.drama_id == drama_id)
                });
                shot.character_ids.sort_unstable();
                shot.character_ids.dedup();

                let storyboard = Storyboard {
                    id: s.next_id(),
                    episode_id,
                    composed_image: None,
                    shot,
                };
                s.storyboards.insert(storyboard.id, storyboard.clone());
                created.push(storyboard);
            }
            Ok(created)
        })
        .await
    }

    #[instrument(skip(self, scenes), fields(count = scenes.len()))]
    async fn replace_scenes(
        &self,
        episode_id: i64,
        scenes: Vec<NewScene>,
    ) -> ReelforgeResult<Vec<Scene>> {
        if scenes.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::EmptyResult("scenes".into())).into());
        }

        self.transaction(|s| {
            let drama_id = s.episode(episode_id)?.drama_id;

            let old: BTreeSet<i64> = s
                .scenes
                .values()
                .filter(|scene| scene.episode_id == Some(episode_id))
                .map(|scene| scene.id)
                .collect();
            s.detach_images(SubjectKind::Scene, &old);
            s.scenes.retain(|id, _| !old.contains(id));
            for shot in s.storyboards.values_mut() {
                if shot.shot.scene_id.is_some_and(|id| old.contains(&id)) {
                    shot.shot.scene_id = None;
                }
            }

            let mut created = Vec::with_capacity(scenes.len());
            for new in scenes {
                let scene = Scene {
                    id: s.next_id(),
                    drama_id,
                    episode_id: Some(episode_id),
                    location: new.location,
                    time: new.time,
                    prompt: new.prompt,
                    storyboard_count: new.storyboard_count,
                    status: SceneStatus::Pending,
                    image_url: None,
                };
                for shot in s.storyboards.values_mut() {
                    if shot.episode_id == episode_id
                        && new.shot_numbers.contains(&shot.shot.shot_number)
                    {
                        shot.shot.scene_id = Some(scene.id);
                    }
                }
                s.scenes.insert(scene.id, scene.clone());
                created.push(scene);
            }
            Ok(created)
        })
        .await
    }

    async fn set_episode_duration(&self, episode_id: i64, minutes: i32) -> ReelforgeResult<()> {
        self.transaction(|s| {
            s.episode(episode_id)?;
            if let Some(episode) = s.episodes.get_mut(&episode_id) {
                episode.duration_minutes = minutes;
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, characters), fields(count = characters.len()))]
    async fn upsert_characters(
        &self,
        drama_id: i64,
        episode_id: Option<i64>,
        characters: Vec<NewCharacter>,
    ) -> ReelforgeResult<Vec<Character>> {
        self.transaction(|s| {
            if !s.dramas.contains_key(&drama_id) {
                return Err(PipelineError::not_found("drama", drama_id).into());
            }
            if let Some(episode_id) = episode_id {
                s.episode(episode_id)?;
            }
            let mut result: Vec<Character> = Vec::with_capacity(characters.len());
            for new in characters {
                let name = new.name.trim().to_string();
                if name.is_empty() || result.iter().any(|c| c.name == name) {
                    continue;
                }
                let existing = s
                    .characters
                    .values()
                    .find(|c| c.drama_id == drama_id && c.name == name)
                    .cloned();
                let character = match existing {
                    Some(character) => {
                        debug!(name = %character.name, "Character exists, reusing");
                        character
                    }
                    None => {
                        let character = Character {
                            id: s.next_id(),
                            drama_id,
                            name,
                            role: new.role,
                            description: new.description,
                            personality: new.personality,
                            appearance: new.appearance,
                            voice_style: new.voice_style,
                            image_url: None,
                        };
                        s.characters.insert(character.id, character.clone());
                        character
                    }
                };
                result.push(character);
            }
            if let Some(episode_id) = episode_id {
                for character in &result {
                    s.episode_characters.insert((episode_id, character.id));
                }
            }
            Ok(result)
        })
        .await
    }

    async fn save_frame_prompt(&self, prompt: NewFramePrompt) -> ReelforgeResult<FramePrompt> {
        self.transaction(|s| {
            if !s.storyboards.contains_key(&prompt.storyboard_id) {
                return Err(PipelineError::not_found("storyboard", prompt.storyboard_id).into());
            }
            s.frame_prompts.retain(|_, fp| {
                !(fp.storyboard_id == prompt.storyboard_id && fp.frame_type == prompt.frame_type)
            });
            let record = FramePrompt {
                id: s.next_id(),
                storyboard_id: prompt.storyboard_id,
                frame_type: prompt.frame_type,
                prompt: prompt.prompt,
                description: prompt.description,
                layout: prompt.layout,
                created_at: Utc::now(),
            };
            s.frame_prompts.insert(record.id, record.clone());
            Ok(record)
        })
        .await
    }

    async fn list_frame_prompts(&self, storyboard_id: i64) -> ReelforgeResult<Vec<FramePrompt>> {
        Ok(self
            .read(|s| {
                s.frame_prompts
                    .values()
                    .filter(|fp| fp.storyboard_id == storyboard_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}

#[async_trait]
impl ImageGenerationRepository for InMemoryStore {
    async fn create_image_generation(
        &self,
        record: NewImageGeneration,
    ) -> ReelforgeResult<ImageGeneration> {
        self.transaction(|s| {
            let created = ImageGeneration {
                id: s.next_id(),
                drama_id: record.drama_id,
                target: record.target,
                image_type: record.image_type,
                frame_type: record.frame_type,
                provider: record.provider,
                model: record.model,
                prompt: record.prompt,
                options: record.options,
                status: ImageStatus::Pending,
                provider_task_id: None,
                image_url: None,
                local_path: None,
                width: None,
                height: None,
                error_message: None,
                created_at: Utc::now(),
                completed_at: None,
            };
            s.image_generations.insert(created.id, created.clone());
            Ok(created)
        })
        .await
    }

    async fn get_image_generation(&self, id: i64) -> ReelforgeResult<Option<ImageGeneration>> {
        Ok(self.read(|s| s.image_generations.get(&id).cloned()).await)
    }

    async fn list_image_generations(&self, drama_id: i64) -> ReelforgeResult<Vec<ImageGeneration>> {
        let mut records: Vec<ImageGeneration> = self
            .read(|s| {
                s.image_generations
                    .values()
                    .filter(|r| r.drama_id == drama_id)
                    .cloned()
                    .collect()
            })
            .await;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn delete_image_generation(&self, id: i64) -> ReelforgeResult<bool> {
        self.transaction(|s| Ok(s.image_generations.remove(&id).is_some()))
            .await
    }

    async fn mark_image_processing(
        &self,
        id: i64,
        provider_task_id: Option<String>,
    ) -> ReelforgeResult<()> {
        self.transaction(|s| {
            let record = s.image_generation(id)?;
            record.status = ImageStatus::Processing;
            if provider_task_id.is_some() {
                record.provider_task_id = provider_task_id;
            }
            let scene_id = scene_target(record);
            if let Some(scene) = scene_id.and_then(|id| s.scenes.get_mut(&id)) {
                scene.status = SceneStatus::Generating;
            }
            Ok(())
        })
        .await
    }

    async fn complete_image_generation(
        &self,
        id: i64,
        completion: ImageCompletion,
    ) -> ReelforgeResult<ImageGeneration> {
        self.transaction(|s| {
            let record = s.image_generation(id)?;
            record.status = ImageStatus::Completed;
            record.image_url = Some(completion.image_url.clone());
            record.local_path = completion.local_path;
            if completion.width.is_some() {
                record.width = completion.width;
            }
            if completion.height.is_some() {
                record.height = completion.height;
            }
            record.error_message = None;
            record.completed_at = Some(Utc::now());
            let record = record.clone();

            match record.target {
                Some(target) if target.kind == SubjectKind::Storyboard => {
                    if let Some(shot) = s.storyboards.get_mut(&target.id) {
                        shot.composed_image = Some(completion.image_url);
                    }
                }
                Some(target)
                    if target.kind == SubjectKind::Scene
                        && record.image_type == ImageType::Scene =>
                {
                    if let Some(scene) = s.scenes.get_mut(&target.id) {
                        scene.image_url = Some(completion.image_url);
                        scene.status = SceneStatus::Generated;
                    }
                }
                Some(target) if target.kind == SubjectKind::Character => {
                    if let Some(character) = s.characters.get_mut(&target.id) {
                        character.image_url = Some(completion.image_url);
                    }
                }
                _ => {}
            }
            Ok(record)
        })
        .await
    }

    async fn fail_image_generation(&self, id: i64, message: &str) -> ReelforgeResult<()> {
        let message = message.to_string();
        self.transaction(|s| {
            let record = s.image_generation(id)?;
            record.status = ImageStatus::Failed;
            record.error_message = Some(message);
            record.completed_at = Some(Utc::now());
            let scene_id = scene_target(record);
            if let Some(scene) = scene_id.and_then(|id| s.scenes.get_mut(&id)) {
                scene.status = SceneStatus::Failed;
            }
            Ok(())
        })
        .await
    }
}
