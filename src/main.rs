//! Fryer - package build contexts from remote sources
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use fryer::cli::{Cli, Commands};
use fryer::config::{Config, ConfigManager};
use fryer::error::FryerResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FryerResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!(path = %config_manager.path().display(), "Configuration loaded");

    // Dispatch to command
    match cli.command {
        Commands::Fetch(args) => fryer::cli::commands::fetch(args, &config).await,
        Commands::Context(args) => fryer::cli::commands::context(args, &config).await,
        Commands::Cook(args) => fryer::cli::commands::cook(args, &config).await,
        Commands::Config(args) => {
            fryer::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; logs always go to stderr
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("fryer=warn"),
        1 => EnvFilter::new("fryer=info"),
        _ => EnvFilter::new("fryer=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
