//! Image generation: synchronous and polled providers.

mod test_utils;

use async_trait::async_trait;
use reelforge_core::{
    ImageGenerationRequest, ImageResult, ImageStatus, ImageType, SceneStatus, SubjectKind,
    SubjectRef, TaskStatus,
};
use reelforge_error::{
    PipelineErrorKind, ReelforgeErrorKind, ReelforgeResult, StorageError, StorageErrorKind,
};
use reelforge_interface::{MediaCache, StoryRepository};
use reelforge_pipeline::Pipeline;
use reelforge_database::InMemoryStore;
use reelforge_tasks::{ExecutorConfig, InMemoryTaskRepository, JobExecutor, TaskRegistry};
use std::sync::Arc;
use test_utils::{Harness, ScriptedImage, StubResolver, context_with, harness, seeded_store};

const PROVIDER_URL: &str = "https://cdn.example.com/img/harbor.png?sig=abc&exp=1";

fn request(prompt: &str) -> ImageGenerationRequest {
    ImageGenerationRequest {
        drama_id: 1,
        target: Some(SubjectRef::storyboard(6)),
        image_type: Some(ImageType::Storyboard),
        prompt: prompt.to_string(),
        ..ImageGenerationRequest::default()
    }
}

#[tokio::test]
async fn polled_job_stores_provider_url_verbatim() {
    let image = ScriptedImage::new(
        ImageResult::pending("job-7"),
        vec![
            ImageResult::default(),
            ImageResult::ready(PROVIDER_URL, 0, 768),
        ],
    );
    let h = harness(StubResolver {
        image: Some(image.clone()),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(request("harbor at night, anime style"))
        .await
        .unwrap();
    assert_eq!(submission.generation.status, ImageStatus::Pending);
    assert_eq!(submission.generation.provider, "openai");

    let task = h.wait(&submission.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    assert_eq!(task.subject.kind, SubjectKind::ImageGeneration);
    assert_eq!(task.subject.id, submission.generation.id);
    assert_eq!(image.poll_calls(), 2);

    let record = h.pipeline.images().get(submission.generation.id).await.unwrap();
    assert_eq!(record.status, ImageStatus::Completed);
    assert_eq!(record.image_url.as_deref(), Some(PROVIDER_URL));
    assert_eq!(record.provider_task_id.as_deref(), Some("job-7"));
    assert_eq!(record.width, None);
    assert_eq!(record.height, Some(768));
    assert!(record.local_path.is_none());
}

#[tokio::test]
async fn synchronous_result_completes_without_polling() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 1024, 1024), vec![]);
    let h = harness(StubResolver {
        image: Some(image.clone()),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(request("harbor at night, anime style"))
        .await
        .unwrap();
    let task = h.wait(&submission.task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    assert_eq!(image.poll_calls(), 0);
    let record = h.pipeline.images().get(submission.generation.id).await.unwrap();
    assert_eq!(record.width, Some(1024));
    assert!(record.completed_at.is_some());
}

#[tokio::test]
async fn exhausted_poll_budget_fails_record_and_task() {
    let image = ScriptedImage::new(ImageResult::pending("job-slow"), vec![]);
    let h = harness(StubResolver {
        image: Some(image.clone()),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(request("harbor at night, anime style"))
        .await
        .unwrap();
    let task = h.wait(&submission.task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.message.starts_with("Image generation failed"), "{}", task.message);
    assert_eq!(image.poll_calls(), 5);
    let record = h.pipeline.images().get(submission.generation.id).await.unwrap();
    assert_eq!(record.status, ImageStatus::Failed);
    assert!(record.error_message.is_some());
}

#[tokio::test]
async fn provider_failure_during_poll_fails_the_record() {
    let image = ScriptedImage::new(
        ImageResult::pending("job-bad"),
        vec![ImageResult::failed("content policy")],
    );
    let h = harness(StubResolver {
        image: Some(image),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(request("harbor at night, anime style"))
        .await
        .unwrap();
    let task = h.wait(&submission.task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.message.contains("content policy"), "{}", task.message);
}

#[tokio::test]
async fn short_prompt_is_rejected_before_any_record() {
    let h = harness(StubResolver::default());

    let err = h.pipeline.images().submit(request("hi")).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::Validation(_))
    ));
    assert!(h.pipeline.images().list(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_target_is_not_found() {
    let h = harness(StubResolver::default());
    let mut req = request("harbor at night, anime style");
    req.target = Some(SubjectRef::scene(77));

    let err = h.pipeline.images().submit(req).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::SubjectNotFound { .. })
    ));
}

#[tokio::test]
async fn episode_batch_submits_shots_with_prompts() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 512, 512), vec![]);
    let h = harness(StubResolver {
        image: Some(image),
        ..StubResolver::default()
    });

    let submissions = h.pipeline.images().generate_for_episode(2).await.unwrap();

    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].generation.target,
        Some(SubjectRef::storyboard(6))
    );
    h.wait(&submissions[0].task_id).await;
}

#[tokio::test]
async fn scene_image_uses_scene_prompt() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 512, 512), vec![]);
    let h = harness(StubResolver {
        image: Some(image),
        ..StubResolver::default()
    });

    let submission = h.pipeline.images().generate_for_scene(5).await.unwrap();

    assert_eq!(submission.generation.prompt, "harbor at night, cranes, wet concrete");
    assert_eq!(submission.generation.image_type, ImageType::Scene);
    h.wait(&submission.task_id).await;
}

#[tokio::test]
async fn scene_target_without_image_type_settles_the_scene() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 512, 512), vec![]);
    let h = harness(StubResolver {
        image: Some(image),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(ImageGenerationRequest {
            drama_id: 1,
            target: Some(SubjectRef::scene(5)),
            prompt: "harbor at night, cranes".to_string(),
            ..ImageGenerationRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(submission.generation.image_type, ImageType::Scene);

    let task = h.wait(&submission.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let scene = h.store.get_scene(5).await.unwrap().unwrap();
    assert_eq!(scene.status, SceneStatus::Generated);
    assert_eq!(scene.image_url.as_deref(), Some(PROVIDER_URL));
}

#[tokio::test]
async fn non_scene_image_of_a_scene_leaves_its_status_alone() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 512, 512), vec![]);
    let h = harness(StubResolver {
        image: Some(image),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(ImageGenerationRequest {
            drama_id: 1,
            target: Some(SubjectRef::scene(5)),
            image_type: Some(ImageType::Storyboard),
            prompt: "harbor at night, cranes".to_string(),
            ..ImageGenerationRequest::default()
        })
        .await
        .unwrap();

    let task = h.wait(&submission.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let scene = h.store.get_scene(5).await.unwrap().unwrap();
    assert_eq!(scene.status, SceneStatus::Pending);
    assert_eq!(scene.image_url, None);
}

#[tokio::test]
async fn character_target_implies_character_image() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 512, 512), vec![]);
    let h = harness(StubResolver {
        image: Some(image),
        ..StubResolver::default()
    });

    let submission = h
        .pipeline
        .images()
        .submit(ImageGenerationRequest {
            drama_id: 1,
            target: Some(SubjectRef::character(3)),
            prompt: "Lin, portrait, anime style".to_string(),
            ..ImageGenerationRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(submission.generation.image_type, ImageType::Character);

    h.wait(&submission.task_id).await;
    let lin = h.store.get_character(3).await.unwrap().unwrap();
    assert_eq!(lin.image_url.as_deref(), Some(PROVIDER_URL));
}

struct BrokenCache;

#[async_trait]
impl MediaCache for BrokenCache {
    async fn cache(&self, _url: &str, _category: &str) -> ReelforgeResult<String> {
        Err(StorageError::new(StorageErrorKind::FileWrite("disk full".into())).into())
    }
}

struct FixedCache;

#[async_trait]
impl MediaCache for FixedCache {
    async fn cache(&self, _url: &str, category: &str) -> ReelforgeResult<String> {
        Ok(format!("/var/cache/reelforge/{category}/ab/cd/abcd.png"))
    }
}

fn harness_with_cache(image: Arc<ScriptedImage>, cache: Arc<dyn MediaCache>) -> Harness {
    let store = seeded_store();
    let tasks = TaskRegistry::new(Arc::new(InMemoryTaskRepository::new()));
    let resolver = StubResolver {
        image: Some(image),
        ..StubResolver::default()
    };
    let context = context_with(Arc::new(resolver), store.clone(), tasks.clone()).with_cache(cache);
    Harness {
        store,
        tasks,
        pipeline: Pipeline::new(context),
    }
}

#[tokio::test]
async fn cache_failure_keeps_provider_url() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 1024, 1024), vec![]);
    let h = harness_with_cache(image, Arc::new(BrokenCache));

    let submission = h
        .pipeline
        .images()
        .submit(request("harbor at night, anime style"))
        .await
        .unwrap();
    let task = h.wait(&submission.task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let record = h.pipeline.images().get(submission.generation.id).await.unwrap();
    assert_eq!(record.image_url.as_deref(), Some(PROVIDER_URL));
    assert_eq!(record.local_path, None);
}

#[tokio::test]
async fn cached_copy_is_recorded_beside_provider_url() {
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 1024, 1024), vec![]);
    let h = harness_with_cache(image, Arc::new(FixedCache));

    let submission = h
        .pipeline
        .images()
        .submit(request("harbor at night, anime style"))
        .await
        .unwrap();
    let task = h.wait(&submission.task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let record = h.pipeline.images().get(submission.generation.id).await.unwrap();
    assert_eq!(record.image_url.as_deref(), Some(PROVIDER_URL));
    assert_eq!(
        record.local_path.as_deref(),
        Some("/var/cache/reelforge/images/ab/cd/abcd.png")
    );
}

#[tokio::test]
async fn episode_batch_beyond_queue_depth_schedules_nothing() {
    let mut snapshot = seeded_store().snapshot().await;
    for shot in &mut snapshot.storyboards {
        shot.shot.image_prompt = Some(format!("Harbor, Night, shot {}", shot.shot.shot_number));
    }
    let store = InMemoryStore::from_snapshot(snapshot);
    let tasks = TaskRegistry::new(Arc::new(InMemoryTaskRepository::new()));
    let image = ScriptedImage::new(ImageResult::ready(PROVIDER_URL, 512, 512), vec![]);
    let resolver = StubResolver {
        image: Some(image),
        ..StubResolver::default()
    };
    let context = context_with(Arc::new(resolver), store.clone(), tasks)
        .with_executor(JobExecutor::new(ExecutorConfig {
            max_concurrent: 1,
            queue_depth: 1,
        }));
    let pipeline = Pipeline::new(context.clone());

    let err = pipeline.images().generate_for_episode(2).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::QueueFull { depth: 1 })
    ));
    assert!(pipeline.images().list(1).await.unwrap().is_empty());
    assert_eq!(context.executor().in_flight(), 0);
}
