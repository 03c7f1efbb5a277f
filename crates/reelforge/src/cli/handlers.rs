//! Command handlers.

use super::{Cli, Commands, ImageCommands};
use reelforge::{
    BackgroundExtractionRequest, CharacterGenerationRequest, FramePromptRequest,
    GenerationOptions, ImageGenerationRequest, Project, ReelforgeConfig, ReelforgeResult,
    StoryboardGenerationRequest, SubjectRef, Task, TaskId, TaskStatus,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => warn!(error = %e, "Failed to render output"),
    }
}

/// Run one CLI command against the project named on the command line.
pub async fn run_command(cli: &Cli, config: &ReelforgeConfig) -> ReelforgeResult<()> {
    let project = match cli.database_url.as_deref().or(config.storage.database_url.as_deref()) {
        Some(url) => Project::connect(url, config)?,
        None => Project::open(&cli.project, config)?,
    };
    let pipeline = project.pipeline();
    let timeout = Duration::from_secs(cli.timeout);

    let task_ids: Vec<TaskId> = match &cli.command {
        Commands::Characters {
            drama_id,
            episode,
            outline,
            count,
            temperature,
            model,
        } => vec![
            pipeline
                .characters()
                .submit(CharacterGenerationRequest {
                    drama_id: *drama_id,
                    episode_id: *episode,
                    outline: outline.clone(),
                    count: *count,
                    temperature: *temperature,
                    model: model.clone(),
                })
                .await?,
        ],

        Commands::Storyboard { episode_id, model } => vec![
            pipeline
                .storyboards()
                .submit(StoryboardGenerationRequest {
                    episode_id: *episode_id,
                    model: model.clone(),
                })
                .await?,
        ],

        Commands::FramePrompt {
            storyboard_id,
            frame_type,
            panels,
            model,
        } => vec![
            pipeline
                .frame_prompts()
                .submit(FramePromptRequest {
                    storyboard_id: *storyboard_id,
                    frame_type: *frame_type,
                    panel_count: *panels,
                    model: model.clone(),
                })
                .await?,
        ],

        Commands::Backgrounds {
            episode_id,
            source,
            style,
            model,
        } => vec![
            pipeline
                .backgrounds()
                .submit(BackgroundExtractionRequest {
                    episode_id: *episode_id,
                    source: *source,
                    model: model.clone(),
                    style: style.clone(),
                })
                .await?,
        ],

        Commands::Image(command) => match image_command(&project, command).await? {
            Some(ids) => ids,
            None => return Ok(()),
        },

        Commands::Task { id } => {
            print_json(&pipeline.task(id).await?);
            return Ok(());
        }
    };

    let mut tasks: Vec<Task> = Vec::with_capacity(task_ids.len());
    for id in &task_ids {
        info!(task_id = %id, "Waiting for task");
        let task = project.wait(id, timeout).await?;
        if !task.status.is_terminal() {
            warn!(task_id = %id, status = %task.status, "Task still running at timeout");
        }
        tasks.push(task);
    }
    project.save().await?;

    if let [task] = tasks.as_slice() {
        print_json(task);
    } else {
        print_json(&tasks);
    }

    let failed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Failed)
        .count();
    if failed > 0 {
        warn!(failed, total = tasks.len(), "Some tasks failed");
    }
    Ok(())
}

/// Image subcommands; `None` when the command finished without tasks.
async fn image_command(
    project: &Project,
    command: &ImageCommands,
) -> ReelforgeResult<Option<Vec<TaskId>>> {
    let images = project.pipeline().images();
    let ids = match command {
        ImageCommands::Generate {
            drama_id,
            prompt,
            storyboard,
            scene,
            character,
            provider,
            model,
            size,
        } => {
            let target = storyboard
                .map(SubjectRef::storyboard)
                .or(scene.map(SubjectRef::scene))
                .or(character.map(SubjectRef::character));
            let submission = images
                .submit(ImageGenerationRequest {
                    drama_id: *drama_id,
                    target,
                    provider: provider.clone(),
                    model: model.clone(),
                    prompt: prompt.clone(),
                    options: GenerationOptions {
                        size: size.clone(),
                        ..GenerationOptions::default()
                    },
                    ..ImageGenerationRequest::default()
                })
                .await?;
            vec![submission.task_id]
        }

        ImageCommands::Scene { scene_id } => vec![images.generate_for_scene(*scene_id).await?.task_id],

        ImageCommands::Episode { episode_id } => images
            .generate_for_episode(*episode_id)
            .await?
            .into_iter()
            .map(|s| s.task_id)
            .collect(),

        ImageCommands::List { drama_id } => {
            print_json(&images.list(*drama_id).await?);
            return Ok(None);
        }

        ImageCommands::Delete { id } => {
            images.delete(*id).await?;
            project.save().await?;
            info!(image_generation_id = id, "Image record deleted");
            return Ok(None);
        }
    };
    Ok(Some(ids))
}
