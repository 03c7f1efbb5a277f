use reelforge_core::{SubjectRef, TaskStatus, TaskType};
use reelforge_error::{ReelforgeErrorKind, TaskErrorKind};
use reelforge_tasks::{InMemoryTaskRepository, TaskRegistry};
use serde_json::json;
use std::sync::Arc;

fn registry() -> TaskRegistry {
    TaskRegistry::new(Arc::new(InMemoryTaskRepository::new()))
}

#[tokio::test]
async fn task_moves_through_lifecycle() {
    let registry = registry();
    let task = registry
        .create(TaskType::StoryboardGeneration, SubjectRef::episode(3))
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Pending);

    registry
        .update_status(&task.id, TaskStatus::Processing, 10, "Generating")
        .await
        .unwrap();
    registry
        .update_status(&task.id, TaskStatus::Processing, 50, "Parsing")
        .await
        .unwrap();
    let done = registry
        .complete(&task.id, json!({"total": 2}))
        .await
        .unwrap();

    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.result, Some(json!({"total": 2})));
    assert_eq!(registry.get(&task.id).await.unwrap().progress, 100);
}

#[tokio::test]
async fn completed_task_cannot_fail() {
    let registry = registry();
    let task = registry
        .create(TaskType::ImageGeneration, SubjectRef::drama(1))
        .await
        .unwrap();
    registry
        .update_status(&task.id, TaskStatus::Processing, 0, "Started")
        .await
        .unwrap();
    registry.complete(&task.id, json!({})).await.unwrap();

    let err = registry.fail(&task.id, "late", "late failure").await.unwrap_err();
    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Task(e) if matches!(e.kind, TaskErrorKind::InvalidTransition { .. })
    ));
    assert_eq!(
        registry.get(&task.id).await.unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn progress_after_terminal_is_ignored() {
    let registry = registry();
    let task = registry
        .create(TaskType::BackgroundExtraction, SubjectRef::episode(1))
        .await
        .unwrap();
    registry
        .update_status(&task.id, TaskStatus::Processing, 0, "Started")
        .await
        .unwrap();
    registry.fail(&task.id, "failed", "boom").await.unwrap();

    let after = registry
        .update_status(&task.id, TaskStatus::Processing, 90, "late progress")
        .await
        .unwrap();
    assert_eq!(after.status, TaskStatus::Failed);
    assert_eq!(after.message, "failed");
}

#[tokio::test]
async fn pending_task_cannot_complete() {
    let registry = registry();
    let task = registry
        .create(TaskType::CharacterGeneration, SubjectRef::drama(1))
        .await
        .unwrap();
    assert!(registry.complete(&task.id, json!({})).await.is_err());
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let registry = registry();
    let err = registry
        .get(&reelforge_core::TaskId::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ReelforgeErrorKind::Task(e) if matches!(e.kind, TaskErrorKind::NotFound(_))
    ));
}

#[tokio::test]
async fn wait_returns_once_task_is_terminal() {
    let registry = registry();
    let task = registry
        .create(TaskType::ImageGeneration, SubjectRef::drama(1))
        .await
        .unwrap();

    let worker = registry.clone();
    let id = task.id;
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        worker
            .update_status(&id, TaskStatus::Processing, 10, "Working")
            .await
            .unwrap();
        worker.complete(&id, json!({"ok": true})).await.unwrap();
    });

    let done = registry
        .wait_until_terminal(
            &task.id,
            std::time::Duration::from_millis(5),
            std::time::Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);

    let pending = registry
        .create(TaskType::ImageGeneration, SubjectRef::drama(1))
        .await
        .unwrap();
    let still = registry
        .wait_until_terminal(
            &pending.id,
            std::time::Duration::from_millis(5),
            std::time::Duration::from_millis(20),
        )
        .await
        .unwrap();
    assert_eq!(still.status, TaskStatus::Pending);
}

#[tokio::test]
async fn reloaded_repository_keeps_tasks() {
    let repository = InMemoryTaskRepository::new();
    let registry = TaskRegistry::new(Arc::new(repository.clone()));
    let task = registry
        .create(TaskType::CharacterGeneration, SubjectRef::drama(1))
        .await
        .unwrap();

    let reloaded = InMemoryTaskRepository::from_tasks(repository.all().await);
    let registry = TaskRegistry::new(Arc::new(reloaded));
    assert_eq!(registry.get(&task.id).await.unwrap(), task);
}
