//! In-memory task storage.

use async_trait::async_trait;
use reelforge_core::{SubjectRef, Task, TaskId};
use reelforge_error::{ReelforgeResult, TaskError, TaskErrorKind};
use reelforge_interface::TaskRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Task store backed by a map behind an async lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `tasks`, e.g. reloaded from a project file.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks.into_iter().map(|t| (t.id, t)).collect())),
        }
    }

    /// Every stored task, oldest first.
    pub async fn all(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tasks
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert_task(&self, task: &Task) -> ReelforgeResult<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> ReelforgeResult<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(TaskError::new(TaskErrorKind::NotFound(task.id.to_string())).into()),
        }
    }

    async fn get_task(&self, id: &TaskId) -> ReelforgeResult<Option<Task>> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn list_tasks(&self, subject: &SubjectRef) -> ReelforgeResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.subject == *subject)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }
}
