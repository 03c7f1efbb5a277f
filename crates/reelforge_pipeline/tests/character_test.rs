//! Character generation and executor back-pressure.

mod test_utils;

use async_trait::async_trait;
use reelforge_core::{CharacterGenerationRequest, GenerationOptions, SubjectRef, TaskStatus};
use reelforge_error::{PipelineErrorKind, ReelforgeErrorKind, ReelforgeResult};
use reelforge_interface::{
    ImageGenerator, ProviderResolver, StoryRepository, TextGenerator,
};
use reelforge_pipeline::Pipeline;
use reelforge_tasks::{ExecutorConfig, JobExecutor};
use std::sync::Arc;
use test_utils::{ScriptedText, StubResolver, harness};

const CAST: &str = r#"{"characters": [
  {"name": "Lin", "role": "lead"},
  {"name": "  Mei  ", "role": "supporting", "appearance": "red coat"},
  {"name": "", "role": "nobody"}
]}"#;

fn request(count: Option<u32>) -> CharacterGenerationRequest {
    CharacterGenerationRequest {
        drama_id: 1,
        episode_id: Some(2),
        count,
        ..CharacterGenerationRequest::default()
    }
}

#[tokio::test]
async fn generated_cast_reuses_existing_names_and_links_episode() {
    let text = ScriptedText::new(vec![Ok(CAST)]);
    let h = harness(StubResolver {
        text: Some(text.clone()),
        ..StubResolver::default()
    });

    let task_id = h.pipeline.characters().submit(request(Some(3))).await.unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    assert_eq!(task.subject, SubjectRef::drama(1));
    assert_eq!(task.result.unwrap()["count"], 2);
    assert!(text.prompts()[0].contains("Tidebreak"));

    let cast = h.store.list_characters(1).await.unwrap();
    let names: Vec<&str> = cast.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Lin", "Zhou", "Mei"]);
    let lin = cast.iter().find(|c| c.name == "Lin").unwrap();
    assert_eq!(lin.id, 3);
    assert_eq!(lin.role, None);

    let snapshot = h.store.snapshot().await;
    let mei = cast.iter().find(|c| c.name == "Mei").unwrap();
    assert!(snapshot.episode_characters.contains(&(2, 3)));
    assert!(snapshot.episode_characters.contains(&(2, mei.id)));
}

#[tokio::test]
async fn answer_without_names_fails() {
    let text = ScriptedText::new(vec![Ok(r#"[{"name": "  "}]"#)]);
    let h = harness(StubResolver {
        text: Some(text),
        ..StubResolver::default()
    });

    let task_id = h.pipeline.characters().submit(request(None)).await.unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(h.store.list_characters(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn count_out_of_range_is_invalid() {
    let h = harness(StubResolver::default());

    for count in [0, 51] {
        let err = h
            .pipeline
            .characters()
            .submit(request(Some(count)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::Validation(_))
        ));
    }
    assert!(h.tasks.list_for(&SubjectRef::drama(1)).await.unwrap().is_empty());
}

/// Text provider that never answers.
struct Stalled;

#[async_trait]
impl TextGenerator for Stalled {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _options: &GenerationOptions,
    ) -> ReelforgeResult<String> {
        std::future::pending().await
    }

    fn provider_name(&self) -> &str {
        "stalled"
    }

    fn model_name(&self) -> &str {
        "stalled"
    }
}

struct StalledResolver;

#[async_trait]
impl ProviderResolver for StalledResolver {
    async fn text_generator(&self, _model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>> {
        Ok(Arc::new(Stalled))
    }

    async fn image_generator(&self, model: Option<&str>) -> ReelforgeResult<Arc<dyn ImageGenerator>> {
        StubResolver::default().image_generator(model).await
    }
}

#[tokio::test]
async fn full_queue_rejects_without_creating_a_task() {
    let h = harness(StubResolver::default());
    let context = test_utils::context_with(Arc::new(StalledResolver), h.store.clone(), h.tasks.clone())
        .with_executor(JobExecutor::new(ExecutorConfig {
            max_concurrent: 1,
            queue_depth: 1,
        }));
    let pipeline = Pipeline::new(context);

    let first = pipeline.characters().submit(request(None)).await.unwrap();
    let err = pipeline.characters().submit(request(None)).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::QueueFull { depth: 1 })
    ));
    let tasks = h.tasks.list_for(&SubjectRef::drama(1)).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, first);
}
