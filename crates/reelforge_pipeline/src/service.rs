//! All orchestrators wired over one context.

use crate::{
    BackgroundExtractor, CharacterGenerator, FramePromptGenerator, ImageGenerationService,
    PipelineContext, StoryboardGenerator,
};
use reelforge_core::{Task, TaskId};
use reelforge_error::ReelforgeResult;

/// The five orchestrators sharing one [`PipelineContext`].
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct Pipeline {
    context: PipelineContext,
    characters: CharacterGenerator,
    storyboards: StoryboardGenerator,
    frame_prompts: FramePromptGenerator,
    images: ImageGenerationService,
    backgrounds: BackgroundExtractor,
}

impl Pipeline {
    /// Build every orchestrator over `context`.
    pub fn new(context: PipelineContext) -> Self {
        Self {
            characters: CharacterGenerator::new(context.clone()),
            storyboards: StoryboardGenerator::new(context.clone()),
            frame_prompts: FramePromptGenerator::new(context.clone()),
            images: ImageGenerationService::new(context.clone()),
            backgrounds: BackgroundExtractor::new(context.clone()),
            context,
        }
    }

    /// Current state of a task.
    pub async fn task(&self, id: &TaskId) -> ReelforgeResult<Task> {
        self.context.tasks().get(id).await
    }
}
