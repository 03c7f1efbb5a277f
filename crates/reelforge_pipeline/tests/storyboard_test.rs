//! Storyboard decomposition through the task lifecycle.

mod test_utils;

use async_trait::async_trait;
use reelforge_core::{GenerationOptions, StoryboardGenerationRequest, SubjectRef, TaskStatus};
use reelforge_error::{PipelineErrorKind, ReelforgeErrorKind, ReelforgeResult};
use reelforge_interface::{ImageGenerator, ProviderResolver, StoryRepository, TextGenerator};
use reelforge_pipeline::{MAX_SHOT_SECONDS, Pipeline};
use std::sync::Arc;
use test_utils::{ScriptedText, StubResolver, harness};

const SHOTS: &str = r#"[
  {"shot_number": 1, "shot_type": "远景", "location": "Harbor", "time": "Night",
   "action": "Lin waits by the cranes, 然后 turns", "duration": 40, "characters": [3, 99]},
  {"location": "Warehouse", "time": "Night", "action": "Zhou counts the crates",
   "dialogue": "It's all here.", "duration": 30, "character_ids": [4]}
]"#;

async fn run(response: &str) -> (test_utils::Harness, reelforge_core::Task) {
    let text = ScriptedText::new(vec![Ok(response)]);
    let h = harness(StubResolver {
        text: Some(text),
        ..StubResolver::default()
    });
    let task_id = h
        .pipeline
        .storyboards()
        .submit(StoryboardGenerationRequest {
            episode_id: 2,
            model: None,
        })
        .await
        .unwrap();
    let task = h.wait(&task_id).await;
    (h, task)
}

#[tokio::test]
async fn shots_replace_the_episode_storyboard() {
    let (h, task) = run(SHOTS).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");

    let result = task.result.unwrap();
    assert_eq!(result["total"], 2);
    assert_eq!(result["total_duration"], 70);
    assert_eq!(result["duration_minutes"], 2);

    let shots = h.store.list_storyboards(2).await.unwrap();
    assert_eq!(shots.len(), 2);
    assert!(shots.iter().all(|s| s.id != 6 && s.id != 7));
    assert_eq!(shots[0].shot.shot_number, 1);
    assert_eq!(shots[1].shot.shot_number, 2);
    assert_eq!(shots[0].shot.character_ids, vec![3]);
    assert!(shots[0].shot.image_prompt.is_some());
    assert_eq!(shots[1].shot.dialogue.as_deref(), Some("It's all here."));

    let episode = h.store.get_episode(2).await.unwrap().unwrap();
    assert_eq!(episode.duration_minutes, 2);
}

#[tokio::test]
async fn wrapped_and_bare_answers_store_the_same_shots() {
    let (bare, _) = run(SHOTS).await;
    let wrapped_response = format!(
        "Here is the storyboard:\n```json\n{{\"storyboards\": {SHOTS}}}\n```"
    );
    let (wrapped, task) = run(&wrapped_response).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");

    let a: Vec<_> = bare
        .store
        .list_storyboards(2)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.shot)
        .collect();
    let b: Vec<_> = wrapped
        .store
        .list_storyboards(2)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.shot)
        .collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn empty_answer_fails_and_keeps_existing_shots() {
    let (h, task) = run("[]").await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.message.starts_with("Storyboard generation failed"), "{}", task.message);
    let ids: Vec<i64> = h
        .store
        .list_storyboards(2)
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![6, 7]);
}

#[tokio::test]
async fn unparsable_answer_fails_the_task() {
    let (h, task) = run("I could not produce a storyboard.").await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error.is_some());
    assert_eq!(h.store.list_storyboards(2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_episode_creates_no_task() {
    let h = harness(StubResolver::default());

    let err = h
        .pipeline
        .storyboards()
        .submit(StoryboardGenerationRequest {
            episode_id: 404,
            model: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::SubjectNotFound { .. })
    ));
    assert!(h.tasks.list_for(&SubjectRef::episode(404)).await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_durations_are_clamped() {
    let response = r#"[
      {"location": "Harbor", "time": "Night", "action": "Lin waits", "duration": 2000000000},
      {"location": "Harbor", "time": "Night", "action": "Zhou arrives", "duration": 2000000000}
    ]"#;
    let (h, task) = run(response).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");

    let result = task.result.unwrap();
    assert_eq!(result["total_duration"], 2 * MAX_SHOT_SECONDS);
    assert_eq!(result["duration_minutes"], 20);
    let shots = h.store.list_storyboards(2).await.unwrap();
    assert!(shots.iter().all(|s| s.shot.duration == MAX_SHOT_SECONDS));
}

struct Panicking;

#[async_trait]
impl TextGenerator for Panicking {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _options: &GenerationOptions,
    ) -> ReelforgeResult<String> {
        panic!("provider adapter bug")
    }

    fn provider_name(&self) -> &str {
        "panicking"
    }

    fn model_name(&self) -> &str {
        "panicking"
    }
}

struct PanickingResolver;

#[async_trait]
impl ProviderResolver for PanickingResolver {
    async fn text_generator(&self, _model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>> {
        Ok(Arc::new(Panicking))
    }

    async fn image_generator(&self, model: Option<&str>) -> ReelforgeResult<Arc<dyn ImageGenerator>> {
        StubResolver::default().image_generator(model).await
    }
}

#[tokio::test]
async fn panicking_job_fails_its_task() {
    let h = harness(StubResolver::default());
    let context = test_utils::context_with(Arc::new(PanickingResolver), h.store.clone(), h.tasks.clone());
    let pipeline = Pipeline::new(context);

    let task_id = pipeline
        .storyboards()
        .submit(StoryboardGenerationRequest {
            episode_id: 2,
            model: None,
        })
        .await
        .unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.message, "Storyboard generation failed: internal error");
    assert_eq!(h.store.list_storyboards(2).await.unwrap().len(), 2);
}
