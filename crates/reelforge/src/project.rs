//! A project, loaded from a JSON file or held in PostgreSQL, wired to a pipeline.

use crate::ReelforgeConfig;
use reelforge_core::{Task, TaskId};
use reelforge_database::{InMemoryStore, StoreSnapshot};
use reelforge_error::{JsonError, ReelforgeResult, StorageError, StorageErrorKind};
use reelforge_interface::{ProviderConfigStore, ProviderResolver, StoryRepository};
use reelforge_models::{FileMediaCache, ProviderRegistry, StaticProviderConfigs};
use reelforge_pipeline::{Pipeline, PipelineContext};
use reelforge_tasks::{InMemoryTaskRepository, JobExecutor, TaskRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// On-disk project: every story record plus the tasks run against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Story and image records
    #[serde(flatten)]
    pub store: StoreSnapshot,
    /// Task history
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ProjectFile {
    /// Read a project file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> ReelforgeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?;
        let file: Self = serde_json::from_str(&text)
            .map_err(|e| JsonError::new(format!("Invalid project file {}: {}", path.display(), e)))?;
        debug!(
            dramas = file.store.dramas.len(),
            tasks = file.tasks.len(),
            "Loaded project file"
        );
        Ok(file)
    }

    /// Write the project file as pretty JSON.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> ReelforgeResult<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| JsonError::new(format!("Failed to encode project: {}", e)))?;
        std::fs::write(path, text).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
        })?;
        Ok(())
    }
}

/// Where an open project keeps its records and tasks.
#[derive(Debug, Clone)]
enum Backend {
    /// Loaded from a project file and written back by [`Project::save`]
    File {
        path: PathBuf,
        store: InMemoryStore,
        tasks: InMemoryTaskRepository,
    },
    /// Every write is committed to PostgreSQL as it happens
    #[cfg(feature = "postgres")]
    Postgres,
}

/// An open project with its pipeline.
#[derive(Debug, Clone)]
pub struct Project {
    backend: Backend,
    pipeline: Pipeline,
}

fn registry(
    config: &ReelforgeConfig,
    fallback: Option<Arc<dyn ProviderConfigStore>>,
) -> ReelforgeResult<ProviderRegistry> {
    let transport = config.transport()?;
    let providers = config.provider_configs()?;
    info!(providers = providers.len(), "Configured providers");
    let configs: Arc<dyn ProviderConfigStore> = match fallback {
        Some(store) if providers.is_empty() => {
            info!("No providers in configuration, using database provider table");
            store
        }
        _ => Arc::new(StaticProviderConfigs::new(providers)),
    };
    Ok(ProviderRegistry::new(configs, transport))
}

impl Project {
    /// Open `path` with providers, limits and cache taken from `config`.
    pub fn open(path: impl Into<PathBuf>, config: &ReelforgeConfig) -> ReelforgeResult<Self> {
        let path = path.into();
        let file = ProjectFile::load(&path)?;
        let resolver = registry(config, None)?;

        let mut project = Self::with_resolver(path, file, Arc::new(resolver), config);
        if let Some(dir) = &config.storage.cache_dir {
            let cache = FileMediaCache::new(dir, config.transport()?)?;
            let context = project.pipeline.context().clone().with_cache(Arc::new(cache));
            project.pipeline = Pipeline::new(context);
        }
        Ok(project)
    }

    /// Wire `file` to an explicit provider resolver.
    pub fn with_resolver(
        path: impl Into<PathBuf>,
        file: ProjectFile,
        resolver: Arc<dyn ProviderResolver>,
        config: &ReelforgeConfig,
    ) -> Self {
        let store = InMemoryStore::from_snapshot(file.store);
        let tasks = InMemoryTaskRepository::from_tasks(file.tasks);
        let context = PipelineContext::new(
            resolver,
            TaskRegistry::new(Arc::new(tasks.clone())),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
        .with_executor(JobExecutor::new(config.executor_config()))
        .with_settings(config.pipeline_settings());

        Self {
            backend: Backend::File {
                path: path.into(),
                store,
                tasks,
            },
            pipeline: Pipeline::new(context),
        }
    }

    /// Open the project held in the PostgreSQL database at `database_url`.
    ///
    /// Pending migrations are applied first. Providers come from `config`,
    /// or from the database's provider table when `config` lists none.
    #[cfg(feature = "postgres")]
    #[instrument(skip_all)]
    pub fn connect(database_url: &str, config: &ReelforgeConfig) -> ReelforgeResult<Self> {
        let store = Arc::new(reelforge_database::PostgresStore::connect(Some(database_url))?);
        info!("Connected to project database");
        let resolver = registry(config, Some(store.clone() as Arc<dyn ProviderConfigStore>))?;

        let mut context = PipelineContext::new(
            Arc::new(resolver),
            TaskRegistry::new(store.clone()),
            store.clone(),
            store,
        )
        .with_executor(JobExecutor::new(config.executor_config()))
        .with_settings(config.pipeline_settings());
        if let Some(dir) = &config.storage.cache_dir {
            context = context.with_cache(Arc::new(FileMediaCache::new(dir, config.transport()?)?));
        }
        Ok(Self {
            backend: Backend::Postgres,
            pipeline: Pipeline::new(context),
        })
    }

    /// Database projects need the `postgres` feature.
    #[cfg(not(feature = "postgres"))]
    pub fn connect(_database_url: &str, _config: &ReelforgeConfig) -> ReelforgeResult<Self> {
        Err(reelforge_error::ConfigError::new(
            "a database URL was given but reelforge was built without the postgres feature",
        )
        .into())
    }

    /// Orchestrators bound to this project.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Story store of this project.
    pub fn store(&self) -> &Arc<dyn StoryRepository> {
        self.pipeline.context().story()
    }

    /// Wait for a task to finish, re-reading it every 200 ms.
    ///
    /// Returns the last state seen, which is still running if `timeout` passed.
    pub async fn wait(&self, id: &TaskId, timeout: Duration) -> ReelforgeResult<Task> {
        self.pipeline
            .context()
            .tasks()
            .wait_until_terminal(id, Duration::from_millis(200), timeout)
            .await
    }

    /// Write records and tasks back to the project file.
    ///
    /// Database projects are already up to date.
    pub async fn save(&self) -> ReelforgeResult<()> {
        match &self.backend {
            Backend::File { path, store, tasks } => {
                let file = ProjectFile {
                    store: store.snapshot().await,
                    tasks: tasks.all().await,
                };
                file.save(path)?;
                info!(path = %path.display(), "Project saved");
            }
            #[cfg(feature = "postgres")]
            Backend::Postgres => debug!("Database project, nothing to write"),
        }
        Ok(())
    }
}
