//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::{CommandFactory, Parser};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Load configuration
    let config = Config::load(cli.config_dir)?;
    tracing::debug!(dir = %config.dir.display(), "configuration directory");

    // Create context for commands
    let ctx = commands::Context {
        credentials: Arc::new(config.credential_store()),
        config,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        verbose: cli.verbose,
    };

    // Dispatch to appropriate command
    match command {
        Commands::Join(args) => commands::join::execute(ctx, args).await,
        Commands::Cert(args) => commands::cert::execute(ctx, args).await,
        Commands::Hosts(args) => commands::hosts::execute(ctx, args),
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool, no_color: bool) {
    let default = if verbose { "fly=debug" } else { "fly=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .try_init();
}
