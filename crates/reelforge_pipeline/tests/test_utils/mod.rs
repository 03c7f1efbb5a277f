//! Stub providers and a seeded store for orchestrator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use reelforge_core::{
    Character, Drama, Episode, GenerationOptions, ImageResult, Scene, SceneStatus, ShotSpec,
    Storyboard, Task, TaskId,
};
use reelforge_database::{InMemoryStore, StoreSnapshot};
use reelforge_error::{ProviderError, ProviderErrorKind, ReelforgeResult};
use reelforge_interface::{ImageGenerator, ProviderResolver, TextGenerator};
use reelforge_pipeline::{Pipeline, PipelineContext, PipelineSettings};
use reelforge_tasks::{InMemoryTaskRepository, PollConfig, TaskRegistry};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Text provider answering from a script; `Err` entries simulate a provider failure.
///
/// Once the script runs out every call fails.
pub struct ScriptedText {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedText {
    pub fn new(responses: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _options: &GenerationOptions,
    ) -> ReelforgeResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ProviderError::new(ProviderErrorKind::Api {
                status: 500,
                message,
            })
            .into()),
            None => Err(ProviderError::new(ProviderErrorKind::Request("script exhausted".into())).into()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-text"
    }
}

/// Image provider with a scripted first answer and scripted polls.
pub struct ScriptedImage {
    first: ImageResult,
    polls: Mutex<VecDeque<ImageResult>>,
    poll_calls: Mutex<u32>,
}

impl ScriptedImage {
    pub fn new(first: ImageResult, polls: Vec<ImageResult>) -> Arc<Self> {
        Arc::new(Self {
            first,
            polls: Mutex::new(polls.into()),
            poll_calls: Mutex::new(0),
        })
    }

    pub fn poll_calls(&self) -> u32 {
        *self.poll_calls.lock().unwrap()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedImage {
    async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> ReelforgeResult<ImageResult> {
        Ok(self.first.clone())
    }

    async fn poll(&self, _task_id: &str) -> ReelforgeResult<ImageResult> {
        *self.poll_calls.lock().unwrap() += 1;
        Ok(self.polls.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-image"
    }
}

/// Resolver handing out fixed clients; a missing client is "not configured".
#[derive(Default)]
pub struct StubResolver {
    pub text: Option<Arc<ScriptedText>>,
    pub image: Option<Arc<ScriptedImage>>,
}

#[async_trait]
impl ProviderResolver for StubResolver {
    async fn text_generator(&self, _model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>> {
        match &self.text {
            Some(client) => Ok(client.clone()),
            None => Err(ProviderError::new(ProviderErrorKind::NoProviderConfigured("text".into())).into()),
        }
    }

    async fn image_generator(&self, _model: Option<&str>) -> ReelforgeResult<Arc<dyn ImageGenerator>> {
        match &self.image {
            Some(client) => Ok(client.clone()),
            None => Err(ProviderError::new(ProviderErrorKind::NoProviderConfigured("image".into())).into()),
        }
    }
}

pub fn character(id: i64, name: &str) -> Character {
    Character {
        id,
        drama_id: 1,
        name: name.to_string(),
        role: None,
        description: None,
        personality: None,
        appearance: None,
        voice_style: None,
        image_url: None,
    }
}

/// Drama 1; episode 2 with a script; characters 3 (Lin) and 4 (Zhou);
/// scene 5 (Harbor, Night); shots 6 and 7, shot 6 in scene 5 featuring Lin.
pub fn seeded_store() -> InMemoryStore {
    InMemoryStore::from_snapshot(StoreSnapshot {
        dramas: vec![Drama {
            id: 1,
            title: "Tidebreak".into(),
            description: Some("A smuggler turns informant.".into()),
            genre: Some("thriller".into()),
        }],
        episodes: vec![Episode {
            id: 2,
            drama_id: 1,
            episode_number: 1,
            title: "Low Tide".into(),
            script_content: Some("Lin waits at the harbor. Zhou arrives with the ledger.".into()),
            description: None,
            duration_minutes: 0,
        }],
        characters: vec![character(3, "Lin"), character(4, "Zhou")],
        scenes: vec![Scene {
            id: 5,
            drama_id: 1,
            episode_id: Some(2),
            location: "Harbor".into(),
            time: "Night".into(),
            prompt: "harbor at night, cranes, wet concrete".into(),
            storyboard_count: 1,
            status: SceneStatus::Pending,
            image_url: None,
        }],
        storyboards: vec![
            Storyboard {
                id: 6,
                episode_id: 2,
                composed_image: None,
                shot: ShotSpec {
                    scene_id: Some(5),
                    shot_number: 1,
                    location: Some("Harbor".into()),
                    time: Some("Night".into()),
                    action: Some("Lin waits by the cranes".into()),
                    atmosphere: Some("foggy".into()),
                    image_prompt: Some("Harbor, Night, Lin waits, anime style, first frame".into()),
                    duration: 6,
                    character_ids: vec![3],
                    ..ShotSpec::default()
                },
            },
            Storyboard {
                id: 7,
                episode_id: 2,
                composed_image: None,
                shot: ShotSpec {
                    shot_number: 2,
                    location: Some("Harbor".into()),
                    time: Some("Night".into()),
                    action: Some("Zhou hands over the ledger".into()),
                    duration: 5,
                    character_ids: vec![4],
                    ..ShotSpec::default()
                },
            },
        ],
        ..StoreSnapshot::default()
    })
}

pub struct Harness {
    pub store: InMemoryStore,
    pub tasks: TaskRegistry,
    pub pipeline: Pipeline,
}

pub fn harness(resolver: StubResolver) -> Harness {
    harness_with(resolver, seeded_store())
}

pub fn harness_with(resolver: StubResolver, store: InMemoryStore) -> Harness {
    let tasks = TaskRegistry::new(Arc::new(InMemoryTaskRepository::new()));
    let context = context_with(Arc::new(resolver), store.clone(), tasks.clone());
    Harness {
        store,
        tasks,
        pipeline: Pipeline::new(context),
    }
}

/// Context over `store` with a fast poll budget of five attempts.
pub fn context_with(
    resolver: Arc<dyn ProviderResolver>,
    store: InMemoryStore,
    tasks: TaskRegistry,
) -> PipelineContext {
    let settings = PipelineSettings::builder()
        .poll(PollConfig {
            interval: Duration::from_millis(1),
            max_attempts: 5,
        })
        .build()
        .unwrap();
    PipelineContext::new(
        resolver,
        tasks,
        Arc::new(store.clone()),
        Arc::new(store),
    )
    .with_settings(settings)
}

impl Harness {
    pub async fn wait(&self, id: &TaskId) -> Task {
        let task = self
            .tasks
            .wait_until_terminal(id, Duration::from_millis(2), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(task.status.is_terminal(), "task did not finish: {task:?}");
        task
    }
}
