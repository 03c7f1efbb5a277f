//! Project files round-trip through a pipeline run.

use async_trait::async_trait;
use reelforge::{
    Drama, Episode, GenerationOptions, ImageGenerator, Project, ProjectFile, ProviderError,
    ProviderErrorKind, ProviderResolver, ReelforgeConfig, ReelforgeErrorKind, ReelforgeResult,
    StoreSnapshot, StoryRepository, StoryboardGenerationRequest, TaskStatus, TextGenerator,
};
use std::sync::Arc;
use std::time::Duration;

struct FixedText(&'static str);

#[async_trait]
impl TextGenerator for FixedText {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _options: &GenerationOptions,
    ) -> ReelforgeResult<String> {
        Ok(self.0.to_string())
    }

    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct FixedResolver(&'static str);

#[async_trait]
impl ProviderResolver for FixedResolver {
    async fn text_generator(&self, _model: Option<&str>) -> ReelforgeResult<Arc<dyn TextGenerator>> {
        Ok(Arc::new(FixedText(self.0)))
    }

    async fn image_generator(&self, _model: Option<&str>) -> ReelforgeResult<Arc<dyn ImageGenerator>> {
        Err(ProviderError::new(ProviderErrorKind::NoProviderConfigured("image".into())).into())
    }
}

fn project_file() -> ProjectFile {
    ProjectFile {
        store: StoreSnapshot {
            dramas: vec![Drama {
                id: 1,
                title: "Paper Lanterns".into(),
                description: None,
                genre: None,
            }],
            episodes: vec![Episode {
                id: 2,
                drama_id: 1,
                episode_number: 1,
                title: "Festival".into(),
                script_content: Some("A lantern drifts over the river.".into()),
                description: None,
                duration_minutes: 0,
            }],
            ..StoreSnapshot::default()
        },
        tasks: Vec::new(),
    }
}

#[test]
fn project_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");

    project_file().save(&path).unwrap();
    let loaded = ProjectFile::load(&path).unwrap();

    assert_eq!(loaded, project_file());
}

#[test]
fn missing_project_file_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = ProjectFile::load(dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(err.kind(), ReelforgeErrorKind::Storage(_)));
}

#[cfg(not(feature = "postgres"))]
#[test]
fn database_url_needs_postgres_feature() {
    let config = ReelforgeConfig::from_toml_str("").unwrap();

    let err = Project::connect("postgres://reelforge@localhost/reelforge", &config).unwrap_err();

    assert!(matches!(err.kind(), ReelforgeErrorKind::Config(_)));
}

#[tokio::test]
async fn generation_results_and_tasks_are_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    let config = ReelforgeConfig::from_toml_str("").unwrap();
    let resolver = FixedResolver(
        r#"[{"location": "River", "time": "Night", "action": "A lantern drifts", "duration": 8}]"#,
    );

    let project = Project::with_resolver(&path, project_file(), Arc::new(resolver), &config);
    let task_id = project
        .pipeline()
        .storyboards()
        .submit(StoryboardGenerationRequest {
            episode_id: 2,
            model: None,
        })
        .await
        .unwrap();
    let task = project.wait(&task_id, Duration::from_secs(10)).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed, "{task:?}");
    assert_eq!(project.store().list_storyboards(2).await.unwrap().len(), 1);
    project.save().await.unwrap();

    let saved = ProjectFile::load(&path).unwrap();
    assert_eq!(saved.store.storyboards.len(), 1);
    assert_eq!(saved.store.episodes[0].duration_minutes, 1);
    assert_eq!(saved.tasks.len(), 1);
    assert_eq!(saved.tasks[0].id, task_id);
    assert_eq!(saved.tasks[0].status, TaskStatus::Completed);
}
