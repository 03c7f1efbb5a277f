//! PostgreSQL implementation of the repository traits.

use crate::{PgPool, establish_pool, run_migrations};
use crate::models::{
    CharacterRow, DramaRow, EpisodeRow, FramePromptRow, ImageCompletionChangeset,
    ImageGenerationRow, NewCharacterRow, NewFramePromptRow, NewImageGenerationRow, NewSceneRow,
    NewStoryboardRow, ProviderConfigRow, SceneRow, StoryboardRow, TaskRow,
};
use crate::schema::{
    ai_provider_configs, characters, dramas, episode_characters, episodes, frame_prompts,
    generation_tasks, image_generations, scenes, storyboard_characters, storyboards,
};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use reelforge_core::{
    Capability, Character, Drama, Episode, FramePrompt, ImageCompletion, ImageGeneration,
    ImageStatus, ImageType, NewCharacter, NewFramePrompt, NewImageGeneration, NewScene,
    ProviderConfig, Scene, SceneStatus, ShotSpec, Storyboard, SubjectKind, SubjectRef, Task,
    TaskId,
};
use reelforge_error::{
    DatabaseError, DatabaseErrorKind, PipelineError, PipelineErrorKind, ReelforgeError,
    ReelforgeResult, TaskError, TaskErrorKind,
};
use reelforge_interface::{
    ImageGenerationRepository, ProviderConfigStore, StoryRepository, TaskRepository,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Repository backed by PostgreSQL through a Diesel connection pool.
///
/// Diesel is synchronous, so every call checks out a pooled connection on
/// the blocking thread pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl PostgresStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` (or `DATABASE_URL`) and apply pending migrations.
    ///
    /// # Errors
    ///
    /// Connection or migration failures.
    pub fn connect(database_url: Option<&str>) -> Result<Self, DatabaseError> {
        let pool = establish_pool(database_url)?;
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
        run_migrations(&mut conn)?;
        Ok(Self::new(pool))
    }

    async fn run<T, F>(&self, f: F) -> ReelforgeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> ReelforgeResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> ReelforgeResult<T> {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| {
            DatabaseError::new(DatabaseErrorKind::Query(format!("blocking task failed: {e}")))
        })?
    }

    async fn transaction<T, F>(&self, f: F) -> ReelforgeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> ReelforgeResult<T> + Send + 'static,
    {
        self.run(move |conn| conn.transaction::<_, ReelforgeError, _>(f))
            .await
    }
}

fn episode_drama(conn: &mut PgConnection, episode_id: i64) -> ReelforgeResult<i64> {
    episodes::table
        .find(episode_id)
        .select(episodes::drama_id)
        .first::<i64>(conn)
        .optional()?
        .ok_or_else(|| PipelineError::not_found("episode", episode_id).into())
}

fn character_links(
    conn: &mut PgConnection,
    storyboard_ids: &[i64],
) -> ReelforgeResult<HashMap<i64, Vec<i64>>> {
    let links: Vec<(i64, i64)> = storyboard_characters::table
        .filter(storyboard_characters::storyboard_id.eq_any(storyboard_ids))
        .select((
            storyboard_characters::storyboard_id,
            storyboard_characters::character_id,
        ))
        .order(storyboard_characters::character_id.asc())
        .load(conn)?;
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (storyboard_id, character_id) in links {
        grouped.entry(storyboard_id).or_default().push(character_id);
    }
    Ok(grouped)
}

fn with_characters(
    conn: &mut PgConnection,
    rows: Vec<StoryboardRow>,
) -> ReelforgeResult<Vec<Storyboard>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut links = character_links(conn, &ids)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let characters = links.remove(&row.id).unwrap_or_default();
            row.into_storyboard(characters)
        })
        .collect())
}

fn detach_images(
    conn: &mut PgConnection,
    kind: SubjectKind,
    ids: &[i64],
) -> ReelforgeResult<usize> {
    let detached = diesel::update(
        image_generations::table
            .filter(image_generations::target_kind.eq(kind.to_string()))
            .filter(image_generations::target_id.eq_any(ids)),
    )
    .set((
        image_generations::target_kind.eq(None::<String>),
        image_generations::target_id.eq(None::<i64>),
    ))
    .execute(conn)?;
    Ok(detached)
}

fn load_image(conn: &mut PgConnection, id: i64) -> ReelforgeResult<ImageGeneration> {
    let row = image_generations::table
        .find(id)
        .select(ImageGenerationRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::NotFound(format!("image generation {id}")))
        })?;
    Ok(ImageGeneration::try_from(row)?)
}

fn set_scene_status(
    conn: &mut PgConnection,
    record: &ImageGeneration,
    status: SceneStatus,
) -> ReelforgeResult<()> {
    if let Some(scene_id) = scene_target(record) {
        diesel::update(scenes::table.find(scene_id))
            .set(scenes::status.eq(status.to_string()))
            .execute(conn)?;
    }
    Ok(())
}

/// Scene whose status a scene-type image settles.
fn scene_target(record: &ImageGeneration) -> Option<i64> {
    record
        .target
        .filter(|t| t.kind == SubjectKind::Scene && record.image_type == ImageType::Scene)
        .map(|t| t.id)
}

#[async_trait]
impl TaskRepository for PostgresStore {
    async fn insert_task(&self, task: &Task) -> ReelforgeResult<()> {
        let row = TaskRow::from(task);
        self.run(move |conn| {
            diesel::insert_into(generation_tasks::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> ReelforgeResult<()> {
        let row = TaskRow::from(task);
        let id = task.id;
        self.run(move |conn| {
            let updated = diesel::update(generation_tasks::table.find(row.id))
                .set(&row)
                .execute(conn)?;
            if updated == 0 {
                return Err(TaskError::new(TaskErrorKind::NotFound(id.to_string())).into());
            }
            Ok(())
        })
        .await
    }

    async fn get_task(&self, id: &TaskId) -> ReelforgeResult<Option<Task>> {
        let uuid = *id.as_uuid();
        self.run(move |conn| {
            let row = generation_tasks::table
                .find(uuid)
                .select(TaskRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Task::try_from).transpose()?)
        })
        .await
    }

    async fn list_tasks(&self, subject: &SubjectRef) -> ReelforgeResult<Vec<Task>> {
        let subject = *subject;
        self.run(move |conn| {
            let rows: Vec<TaskRow> = generation_tasks::table
                .filter(generation_tasks::subject_kind.eq(subject.kind.to_string()))
                .filter(generation_tasks::subject_id.eq(subject.id))
                .order(generation_tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(Task::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }
}

#[async_trait]
impl ProviderConfigStore for PostgresStore {
    async fn find_by_model(
        &self,
        capability: Capability,
        model: &str,
    ) -> ReelforgeResult<Option<ProviderConfig>> {
        let model = model.to_string();
        self.run(move |conn| {
            let rows: Vec<ProviderConfigRow> = ai_provider_configs::table
                .filter(ai_provider_configs::capability.eq(capability.to_string()))
                .filter(ai_provider_configs::is_active.eq(true))
                .order(ai_provider_configs::priority.desc())
                .select(ProviderConfigRow::as_select())
                .load(conn)?;
            for row in rows {
                let config = ProviderConfig::try_from(row)?;
                if config.serves(&model) {
                    return Ok(Some(config));
                }
            }
            Ok(None)
        })
        .await
    }

    async fn default_for(&self, capability: Capability) -> ReelforgeResult<Option<ProviderConfig>> {
        self.run(move |conn| {
            let row = ai_provider_configs::table
                .filter(ai_provider_configs::capability.eq(capability.to_string()))
                .filter(ai_provider_configs::is_active.eq(true))
                .order((
                    ai_provider_configs::is_default.desc(),
                    ai_provider_configs::priority.desc(),
                ))
                .select(ProviderConfigRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(ProviderConfig::try_from).transpose()?)
        })
        .await
    }
}

#[async_trait]
impl StoryRepository for PostgresStore {
    async fn get_drama(&self, id: i64) -> ReelforgeResult<Option<Drama>> {
        self.run(move |conn| {
            let row = dramas::table
                .find(id)
                .select(DramaRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Drama::from))
        })
        .await
    }

    async fn get_episode(&self, id: i64) -> ReelforgeResult<Option<Episode>> {
        self.run(move |conn| {
            let row = episodes::table
                .find(id)
                .select(EpisodeRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Episode::from))
        })
        .await
    }

    async fn get_character(&self, id: i64) -> ReelforgeResult<Option<Character>> {
        self.run(move |conn| {
            let row = characters::table
                .find(id)
                .select(CharacterRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Character::from))
        })
        .await
    }

    async fn get_scene(&self, id: i64) -> ReelforgeResult<Option<Scene>> {
        self.run(move |conn| {
            let row = scenes::table
                .find(id)
                .select(SceneRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Scene::try_from).transpose()?)
        })
        .await
    }

    async fn get_storyboard(&self, id: i64) -> ReelforgeResult<Option<Storyboard>> {
        self.run(move |conn| {
            let row = storyboards::table
                .find(id)
                .select(StoryboardRow::as_select())
                .first(conn)
                .optional()?;
            match row {
                Some(row) => Ok(with_characters(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_characters(&self, drama_id: i64) -> ReelforgeResult<Vec<Character>> {
        self.run(move |conn| {
            let rows: Vec<CharacterRow> = characters::table
                .filter(characters::drama_id.eq(drama_id))
                .order(characters::id.asc())
                .select(CharacterRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Character::from).collect())
        })
        .await
    }

    async fn list_scenes(&self, episode_id: i64) -> ReelforgeResult<Vec<Scene>> {
        self.run(move |conn| {
            let rows: Vec<SceneRow> = scenes::table
                .filter(scenes::episode_id.eq(episode_id))
                .order(scenes::id.asc())
                .select(SceneRow::as_select())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(Scene::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn list_storyboards(&self, episode_id: i64) -> ReelforgeResult<Vec<Storyboard>> {
        self.run(move |conn| {
            let rows: Vec<StoryboardRow> = storyboards::table
                .filter(storyboards::episode_id.eq(episode_id))
                .order((storyboards::shot_number.asc(), storyboards::id.asc()))
                .select(StoryboardRow::as_select())
                .load(conn)?;
            with_characters(conn, rows)
        })
        .await
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

        self.transaction(move |conn| {
            let drama_id = episode_drama(conn, episode_id)?;

            let old: Vec<i64> = storyboards::table
                .filter(storyboards::episode_id.eq(episode_id))
                .select(storyboards::id)
                .load(conn)?;
            let detached = detach_images(conn, SubjectKind::Storyboard, &old)?;
            diesel::delete(frame_prompts::table.filter(frame_prompts::storyboard_id.eq_any(&old)))
                .execute(conn)?;
            diesel::delete(
                storyboard_characters::table
                    .filter(storyboard_characters::storyboard_id.eq_any(&old)),
            )
            .execute(conn)?;
            diesel::delete(storyboards::table.filter(storyboards::id.eq_any(&old)))
                .execute(conn)?;
            debug!(removed = old.len(), detached, "Cleared previous storyboards");

            let drama_characters: Vec<i64> = characters::table
                .filter(characters::drama_id.eq(drama_id))
                .select(characters::id)
                .load(conn)?;

            let mut created = Vec::with_capacity(shots.len());
            for mut shot in shots {
                shot.character_ids.retain(|id| drama_characters.contains(id));
                shot.character_ids.sort_unstable();
                shot.character_ids.dedup();

                let row: StoryboardRow = diesel::insert_into(storyboards::table)
                    .values(NewStoryboardRow::new(episode_id, &shot))
                    .returning(StoryboardRow::as_returning())
                    .get_result(conn)?;
                let links: Vec<_> = shot
                    .character_ids
                    .iter()
                    .map(|character_id| {
                        (
                            storyboard_characters::storyboard_id.eq(row.id),
                            storyboard_characters::character_id.eq(*character_id),
                        )
                    })
                    .collect();
                if !links.is_empty() {
                    diesel::insert_into(storyboard_characters::table)
                        .values(&links)
                        .execute(conn)?;
                }
                created.push(row.into_storyboard(shot.character_ids));
            }
            Ok(created)
        })
        .await
    }

    #[instrument(skip(self, new_scenes), fields(count = new_scenes.len()))]
    async fn replace_scenes(
        &self,
        episode_id: i64,
        new_scenes: Vec<NewScene>,
    ) -> ReelforgeResult<Vec<Scene>> {
        if new_scenes.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::EmptyResult("scenes".into())).into());
        }

        self.transaction(move |conn| {
            let drama_id = episode_drama(conn, episode_id)?;

            let old: Vec<i64> = scenes::table
                .filter(scenes::episode_id.eq(episode_id))
                .select(scenes::id)
                .load(conn)?;
            detach_images(conn, SubjectKind::Scene, &old)?;
            diesel::update(storyboards::table.filter(storyboards::scene_id.eq_any(&old)))
                .set(storyboards::scene_id.eq(None::<i64>))
                .execute(conn)?;
            diesel::delete(scenes::table.filter(scenes::id.eq_any(&old))).execute(conn)?;

            let mut created = Vec::with_capacity(new_scenes.len());
            for new in new_scenes {
                let row: SceneRow = diesel::insert_into(scenes::table)
                    .values(NewSceneRow {
                        drama_id,
                        episode_id: Some(episode_id),
                        location: new.location,
                        time_of_day: new.time,
                        prompt: new.prompt,
                        storyboard_count: new.storyboard_count,
                        status: SceneStatus::Pending.to_string(),
                    })
                    .returning(SceneRow::as_returning())
                    .get_result(conn)?;
                if !new.shot_numbers.is_empty() {
                    diesel::update(
                        storyboards::table
                            .filter(storyboards::episode_id.eq(episode_id))
                            .filter(storyboards::shot_number.eq_any(&new.shot_numbers)),
                    )
                    .set(storyboards::scene_id.eq(Some(row.id)))
                    .execute(conn)?;
                }
                created.push(Scene::try_from(row)?);
            }
            Ok(created)
        })
        .await
    }

    async fn set_episode_duration(&self, episode_id: i64, minutes: i32) -> ReelforgeResult<()> {
        self.run(move |conn| {
            let updated = diesel::update(episodes::table.find(episode_id))
                .set(episodes::duration_minutes.eq(minutes))
                .execute(conn)?;
            if updated == 0 {
                return Err(PipelineError::not_found("episode", episode_id).into());
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, new_characters), fields(count = new_characters.len()))]
    async fn upsert_characters(
        &self,
        drama_id: i64,
        episode_id: Option<i64>,
        new_characters: Vec<NewCharacter>,
    ) -> ReelforgeResult<Vec<Character>> {
        self.transaction(move |conn| {
            let exists = dramas::table
                .find(drama_id)
                .select(dramas::id)
                .first::<i64>(conn)
                .optional()?;
            if exists.is_none() {
                return Err(PipelineError::not_found("drama", drama_id).into());
            }
            if let Some(episode_id) = episode_id {
                episode_drama(conn, episode_id)?;
            }

            let mut result: Vec<Character> = Vec::with_capacity(new_characters.len());
            for new in new_characters {
                let name = new.name.trim().to_string();
                if name.is_empty() || result.iter().any(|c| c.name == name) {
                    continue;
                }
                let existing = characters::table
                    .filter(characters::drama_id.eq(drama_id))
                    .filter(characters::name.eq(&name))
                    .select(CharacterRow::as_select())
                    .first(conn)
                    .optional()?;
                let row = match existing {
                    Some(row) => {
                        debug!(name = %row.name, "Character exists, reusing");
                        row
                    }
                    None => diesel::insert_into(characters::table)
                        .values(NewCharacterRow::new(drama_id, name, new))
                        .returning(CharacterRow::as_returning())
                        .get_result(conn)?,
                };
                result.push(Character::from(row));
            }

            if let Some(episode_id) = episode_id {
                let links: Vec<_> = result
                    .iter()
                    .map(|character| {
                        (
                            episode_characters::episode_id.eq(episode_id),
                            episode_characters::character_id.eq(character.id),
                        )
                    })
                    .collect();
                if !links.is_empty() {
                    diesel::insert_into(episode_characters::table)
                        .values(&links)
                        .on_conflict_do_nothing()
                        .execute(conn)?;
                }
            }
            Ok(result)
        })
        .await
    }

    async fn save_frame_prompt(&self, prompt: NewFramePrompt) -> ReelforgeResult<FramePrompt> {
        self.transaction(move |conn| {
            let exists = storyboards::table
                .find(prompt.storyboard_id)
                .select(storyboards::id)
                .first::<i64>(conn)
                .optional()?;
            if exists.is_none() {
                return Err(PipelineError::not_found("storyboard", prompt.storyboard_id).into());
            }
            diesel::delete(
                frame_prompts::table
                    .filter(frame_prompts::storyboard_id.eq(prompt.storyboard_id))
                    .filter(frame_prompts::frame_type.eq(prompt.frame_type.to_string())),
            )
            .execute(conn)?;
            let row: FramePromptRow = diesel::insert_into(frame_prompts::table)
                .values(NewFramePromptRow::from(prompt))
                .returning(FramePromptRow::as_returning())
                .get_result(conn)?;
            Ok(FramePrompt::try_from(row)?)
        })
        .await
    }

    async fn list_frame_prompts(&self, storyboard_id: i64) -> ReelforgeResult<Vec<FramePrompt>> {
        self.run(move |conn| {
            let rows: Vec<FramePromptRow> = frame_prompts::table
                .filter(frame_prompts::storyboard_id.eq(storyboard_id))
                .order(frame_prompts::id.asc())
                .select(FramePromptRow::as_select())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(FramePrompt::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }
}

#[async_trait]
impl ImageGenerationRepository for PostgresStore {
    async fn create_image_generation(
        &self,
        record: NewImageGeneration,
    ) -> ReelforgeResult<ImageGeneration> {
        let row = NewImageGenerationRow::try_from(record)?;
        self.run(move |conn| {
            let created: ImageGenerationRow = diesel::insert_into(image_generations::table)
                .values(&row)
                .returning(ImageGenerationRow::as_returning())
                .get_result(conn)?;
            Ok(ImageGeneration::try_from(created)?)
        })
        .await
    }

    async fn get_image_generation(&self, id: i64) -> ReelforgeResult<Option<ImageGeneration>> {
        self.run(move |conn| {
            let row = image_generations::table
                .find(id)
                .select(ImageGenerationRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(ImageGeneration::try_from).transpose()?)
        })
        .await
    }

    async fn list_image_generations(&self, drama_id: i64) -> ReelforgeResult<Vec<ImageGeneration>> {
        self.run(move |conn| {
            let rows: Vec<ImageGenerationRow> = image_generations::table
                .filter(image_generations::drama_id.eq(drama_id))
                .order((
                    image_generations::created_at.desc(),
                    image_generations::id.desc(),
                ))
                .select(ImageGenerationRow::as_select())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(ImageGeneration::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn delete_image_generation(&self, id: i64) -> ReelforgeResult<bool> {
        self.run(move |conn| {
            let deleted = diesel::delete(image_generations::table.find(id)).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn mark_image_processing(
        &self,
        id: i64,
        provider_task_id: Option<String>,
    ) -> ReelforgeResult<()> {
        self.transaction(move |conn| {
            let record = load_image(conn, id)?;
            diesel::update(image_generations::table.find(id))
                .set(image_generations::status.eq(ImageStatus::Processing.to_string()))
                .execute(conn)?;
            if let Some(token) = provider_task_id {
                diesel::update(image_generations::table.find(id))
                    .set(image_generations::provider_task_id.eq(token))
                    .execute(conn)?;
            }
            set_scene_status(conn, &record, SceneStatus::Generating)
        })
        .await
    }

    async fn complete_image_generation(
        &self,
        id: i64,
        completion: ImageCompletion,
    ) -> ReelforgeResult<ImageGeneration> {
        self.transaction(move |conn| {
            load_image(conn, id)?;
            let row: ImageGenerationRow = diesel::update(image_generations::table.find(id))
                .set(ImageCompletionChangeset::new(&completion))
                .returning(ImageGenerationRow::as_returning())
                .get_result(conn)?;
            let record = ImageGeneration::try_from(row)?;
            let url = completion.image_url;

            match record.target {
                Some(target) if target.kind == SubjectKind::Storyboard => {
                    diesel::update(storyboards::table.find(target.id))
                        .set(storyboards::composed_image.eq(Some(url)))
                        .execute(conn)?;
                }
                Some(target)
                    if target.kind == SubjectKind::Scene
                        && record.image_type == ImageType::Scene =>
                {
                    diesel::update(scenes::table.find(target.id))
                        .set((
                            scenes::image_url.eq(Some(url)),
                            scenes::status.eq(SceneStatus::Generated.to_string()),
                        ))
                        .execute(conn)?;
                }
                Some(target) if target.kind == SubjectKind::Character => {
                    diesel::update(characters::table.find(target.id))
                        .set(characters::image_url.eq(Some(url)))
                        .execute(conn)?;
                }
                _ => {}
            }
            Ok(record)
        })
        .await
    }

    async fn fail_image_generation(&self, id: i64, message: &str) -> ReelforgeResult<()> {
        let message = message.to_string();
        self.transaction(move |conn| {
            let record = load_image(conn, id)?;
            diesel::update(image_generations::table.find(id))
                .set((
                    image_generations::status.eq(ImageStatus::Failed.to_string()),
                    image_generations::error_message.eq(Some(message)),
                    image_generations::completed_at.eq(Some(Utc::now())),
                ))
                .execute(conn)?;
            set_scene_status(conn, &record, SceneStatus::Failed)
        })
        .await
    }
}
