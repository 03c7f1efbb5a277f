//! Reelforge CLI binary.
//!
//! Runs one generation against a JSON project file, waits for its task to
//! finish, prints the task and writes the project back.

use clap::Parser;
use reelforge::{ObservabilityConfig, ReelforgeConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, run_command};

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::new().with_json_logs(cli.json_logs);
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    init_observability(&observability)?;

    let config = match &cli.config {
        Some(path) => ReelforgeConfig::from_file(path)?,
        None => ReelforgeConfig::load()?,
    };

    run_command(&cli, &config).await?;
    Ok(())
}
