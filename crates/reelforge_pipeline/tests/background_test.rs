//! Background extraction from scripts and from shots.

mod test_utils;

use reelforge_core::{BackgroundExtractionRequest, BackgroundSource, TaskStatus};
use reelforge_error::{PipelineErrorKind, ReelforgeErrorKind};
use reelforge_interface::StoryRepository;
use test_utils::{ScriptedText, StubResolver, harness};

fn request(source: BackgroundSource) -> BackgroundExtractionRequest {
    BackgroundExtractionRequest {
        episode_id: 2,
        source,
        model: None,
        style: Some("ink wash".to_string()),
    }
}

#[tokio::test]
async fn failed_model_groups_shots_by_location_and_time() {
    let text = ScriptedText::new(vec![Err("upstream unavailable")]);
    let h = harness(StubResolver {
        text: Some(text),
        ..StubResolver::default()
    });

    let task_id = h
        .pipeline
        .backgrounds()
        .submit(request(BackgroundSource::Storyboards))
        .await
        .unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let result = task.result.unwrap();
    assert_eq!(result["count"], 1);
    assert_eq!(result["drama_id"], 1);

    let scenes = h.store.list_scenes(2).await.unwrap();
    assert_eq!(scenes.len(), 1);
    let scene = &scenes[0];
    assert_ne!(scene.id, 5);
    assert_eq!((scene.location.as_str(), scene.time.as_str()), ("Harbor", "Night"));
    assert_eq!(scene.storyboard_count, 2);
    assert_eq!(scene.prompt, "Harbor, Night, Lin waits, anime style, first frame");

    let shots = h.store.list_storyboards(2).await.unwrap();
    assert!(shots.iter().all(|s| s.shot.scene_id == Some(scene.id)));
}

#[tokio::test]
async fn model_backgrounds_link_listed_shots() {
    let answer = r#"{"backgrounds": [
      {"location": "Harbor", "time": "Night", "prompt": "cranes in fog", "storyboard_number": 1},
      {"location": "Warehouse", "time": "Night", "atmosphere": "dusty", "storyboard_numbers": [2]}
    ]}"#;
    let text = ScriptedText::new(vec![Ok(answer)]);
    let h = harness(StubResolver {
        text: Some(text),
        ..StubResolver::default()
    });

    let task_id = h
        .pipeline
        .backgrounds()
        .submit(request(BackgroundSource::Storyboards))
        .await
        .unwrap();
    let task = h.wait(&task_id).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");

    let scenes = h.store.list_scenes(2).await.unwrap();
    assert_eq!(scenes.len(), 2);
    let warehouse = scenes.iter().find(|s| s.location == "Warehouse").unwrap();
    assert_eq!(warehouse.prompt, "Warehouse, Night, dusty");

    let shot = h.store.get_storyboard(7).await.unwrap().unwrap();
    assert_eq!(shot.shot.scene_id, Some(warehouse.id));
}

#[tokio::test]
async fn script_backgrounds_replace_scenes_without_linking_shots() {
    let answer = r#"[{"location": "Pier", "time": "Dawn", "scene_numbers": [1]}]"#;
    let text = ScriptedText::new(vec![Ok(answer)]);
    let h = harness(StubResolver {
        text: Some(text.clone()),
        ..StubResolver::default()
    });

    let task_id = h
        .pipeline
        .backgrounds()
        .submit(request(BackgroundSource::Script))
        .await
        .unwrap();
    let task = h.wait(&task_id).await;
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    assert!(text.prompts()[0].contains("Zhou arrives with the ledger"));

    let scenes = h.store.list_scenes(2).await.unwrap();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].location, "Pier");
    let shot = h.store.get_storyboard(6).await.unwrap().unwrap();
    assert_eq!(shot.shot.scene_id, None);
}

#[tokio::test]
async fn failed_script_extraction_keeps_existing_scenes() {
    let text = ScriptedText::new(vec![Err("upstream unavailable")]);
    let h = harness(StubResolver {
        text: Some(text),
        ..StubResolver::default()
    });

    let task_id = h
        .pipeline
        .backgrounds()
        .submit(request(BackgroundSource::Script))
        .await
        .unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Failed);
    let scenes = h.store.list_scenes(2).await.unwrap();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].id, 5);
}

#[tokio::test]
async fn unknown_episode_is_not_found() {
    let h = harness(StubResolver::default());
    let mut req = request(BackgroundSource::Script);
    req.episode_id = 40;

    let err = h.pipeline.backgrounds().submit(req).await.unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::SubjectNotFound { .. })
    ));
}
