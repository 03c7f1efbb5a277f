//! Command-line interface module.

mod commands;
mod handlers;

pub use commands::{Cli, Commands, ImageCommands};
pub use handlers::run_command;
