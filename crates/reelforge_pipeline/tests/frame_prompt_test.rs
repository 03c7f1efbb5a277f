//! Frame prompt generation through the task lifecycle.

mod test_utils;

use reelforge_core::{FramePromptRequest, FrameType, SubjectRef, TaskStatus};
use reelforge_error::{PipelineErrorKind, ReelforgeErrorKind};
use reelforge_interface::StoryRepository;
use reelforge_pipeline::{FRAME_SEPARATOR, FramePromptResponse};
use test_utils::{ScriptedText, StubResolver, harness};

fn frame(prompt: &str) -> String {
    format!(r#"{{"prompt": "{prompt}", "description": "generated"}}"#)
}

#[tokio::test]
async fn panel_board_combines_three_labelled_frames() {
    let first = frame("Lin alone under the cranes");
    let key = frame("Zhou steps out of the fog");
    let last = format!("```json\n{}\n```", frame("the ledger changes hands"));
    let text = ScriptedText::new(vec![Ok(&first), Ok(&key), Ok(&last)]);
    let h = harness(StubResolver {
        text: Some(text.clone()),
        ..StubResolver::default()
    });

    let task_id = h
        .pipeline
        .frame_prompts()
        .submit(FramePromptRequest {
            storyboard_id: 6,
            frame_type: FrameType::Panel,
            panel_count: Some(3),
            model: None,
        })
        .await
        .unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    assert_eq!(task.progress, 100);
    assert_eq!(text.calls(), 3);

    let result = task.result.unwrap();
    let response: FramePromptResponse =
        serde_json::from_value(result["response"].clone()).unwrap();
    let multi = response.multi_frame.unwrap();
    assert_eq!(multi.layout, "horizontal_3");
    let labels: Vec<&str> = multi.frames.iter().map(|f| f.description.as_str()).collect();
    assert_eq!(labels, ["第1格：初始状态", "第2格：动作高潮", "第3格：最终状态"]);
    assert_eq!(multi.frames[2].prompt, "the ledger changes hands");

    let stored = h.store.list_frame_prompts(6).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].frame_type, FrameType::Panel);
    assert_eq!(
        stored[0].prompt,
        [
            "Lin alone under the cranes",
            "Zhou steps out of the fog",
            "the ledger changes hands"
        ]
        .join(FRAME_SEPARATOR)
    );
    assert_eq!(stored[0].layout.as_deref(), Some("horizontal_3"));
}

#[tokio::test]
async fn failed_model_calls_fall_back_per_frame() {
    let text = ScriptedText::new(vec![Err("overloaded"), Ok("not json at all")]);
    let h = harness(StubResolver {
        text: Some(text.clone()),
        ..StubResolver::default()
    });

    let task_id = h
        .pipeline
        .frame_prompts()
        .submit(FramePromptRequest {
            storyboard_id: 6,
            frame_type: FrameType::First,
            panel_count: None,
            model: None,
        })
        .await
        .unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let stored = h.store.list_frame_prompts(6).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].prompt.starts_with("Harbor, Night, Lin"), "{}", stored[0].prompt);
}

#[tokio::test]
async fn action_sequence_without_provider_uses_fallback_prompts() {
    let h = harness(StubResolver::default());

    let task_id = h
        .pipeline
        .frame_prompts()
        .submit(FramePromptRequest {
            storyboard_id: 7,
            frame_type: FrameType::Action,
            panel_count: None,
            model: None,
        })
        .await
        .unwrap();
    let task = h.wait(&task_id).await;

    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    let stored = h.store.list_frame_prompts(7).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].prompt.split(FRAME_SEPARATOR).count(), 5);
    assert_eq!(stored[0].layout.as_deref(), Some("horizontal_5"));
}

#[tokio::test]
async fn unknown_shot_is_rejected_without_a_task() {
    let h = harness(StubResolver::default());

    let err = h
        .pipeline
        .frame_prompts()
        .submit(FramePromptRequest {
            storyboard_id: 999,
            frame_type: FrameType::Key,
            panel_count: None,
            model: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::SubjectNotFound { .. })
    ));
    assert!(
        h.tasks
            .list_for(&SubjectRef::storyboard(999))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn panel_count_outside_three_or_four_is_invalid() {
    let h = harness(StubResolver::default());

    let err = h
        .pipeline
        .frame_prompts()
        .submit(FramePromptRequest {
            storyboard_id: 6,
            frame_type: FrameType::Panel,
            panel_count: Some(5),
            model: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Pipeline(e) if matches!(e.kind, PipelineErrorKind::Validation(_))
    ));
    assert!(h.tasks.list_for(&SubjectRef::storyboard(6)).await.unwrap().is_empty());
}
