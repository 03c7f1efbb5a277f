//! CLI command definitions.

use clap::{Parser, Subcommand};
use reelforge::{BackgroundSource, FrameType, TaskId};
use std::path::PathBuf;

/// Reelforge - background AI generation for short dramas
#[derive(Parser, Debug)]
#[command(name = "reelforge")]
#[command(about = "Generate characters, storyboards, frame prompts, images and backgrounds for a drama project", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Project file (JSON)
    #[arg(short, long, global = true, default_value = "reelforge.json")]
    pub project: PathBuf,

    /// PostgreSQL URL; overrides the project file and `[storage] database_url`
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Configuration file, overriding the bundled defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seconds to wait for a task before giving up
    #[arg(long, global = true, default_value = "900")]
    pub timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a drama's characters
    Characters {
        /// Drama ID
        drama_id: i64,

        /// Link the characters to this episode
        #[arg(long)]
        episode: Option<i64>,

        /// Story outline; defaults to the drama's title, synopsis and genre
        #[arg(long)]
        outline: Option<String>,

        /// Number of characters
        #[arg(long)]
        count: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Text model
        #[arg(long)]
        model: Option<String>,
    },

    /// Break an episode into storyboard shots
    Storyboard {
        /// Episode ID
        episode_id: i64,

        /// Text model
        #[arg(long)]
        model: Option<String>,
    },

    /// Generate frame prompts for a shot
    FramePrompt {
        /// Storyboard shot ID
        storyboard_id: i64,

        /// first, key, last, panel or action
        #[arg(long, default_value = "first")]
        frame_type: FrameType,

        /// Panels on a panel board (3 or 4)
        #[arg(long)]
        panels: Option<u32>,

        /// Text model
        #[arg(long)]
        model: Option<String>,
    },

    /// Image generation commands
    #[command(subcommand)]
    Image(ImageCommands),

    /// Extract an episode's background scenes
    Backgrounds {
        /// Episode ID
        episode_id: i64,

        /// script or storyboards
        #[arg(long, default_value = "script")]
        source: BackgroundSource,

        /// Visual style for scene prompts
        #[arg(long)]
        style: Option<String>,

        /// Text model
        #[arg(long)]
        model: Option<String>,
    },

    /// Show a task
    Task {
        /// Task ID
        id: TaskId,
    },
}

/// Image subcommands
#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// Generate one image from a prompt
    Generate {
        /// Drama ID
        drama_id: i64,

        /// Image prompt
        #[arg(long)]
        prompt: String,

        /// Attach to a storyboard shot
        #[arg(long, conflicts_with_all = ["scene", "character"])]
        storyboard: Option<i64>,

        /// Attach to a scene
        #[arg(long, conflicts_with = "character")]
        scene: Option<i64>,

        /// Attach to a character
        #[arg(long)]
        character: Option<i64>,

        /// Provider family recorded on the image
        #[arg(long)]
        provider: Option<String>,

        /// Image model
        #[arg(long)]
        model: Option<String>,

        /// Size such as 1024x1024
        #[arg(long)]
        size: Option<String>,
    },

    /// Generate a scene's background image
    Scene {
        /// Scene ID
        scene_id: i64,
    },

    /// Generate images for every shot of an episode that has an image prompt
    Episode {
        /// Episode ID
        episode_id: i64,
    },

    /// List a drama's images
    List {
        /// Drama ID
        drama_id: i64,
    },

    /// Delete an image record
    Delete {
        /// Image generation ID
        id: i64,
    },
}
