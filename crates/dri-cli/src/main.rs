//! DRI CLI - Main entry point

use clap::Parser;
use dri_cli::{Cli, Commands};
use dri_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    if cli.command.is_none() {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    }

    // Initialize logging from the environment; LOG_LEVEL takes precedence
    // over the verbose flag when set
    let mut log_config = LogConfig::from_env().unwrap_or_else(|_| {
        LogConfig::builder()
            .output(LogOutput::Console)
            .log_file_prefix("dri".to_string())
            .build()
    });
    if std::env::var("LOG_LEVEL").is_err() {
        log_config.level = if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        };
    }

    // Initialize logging (ignore errors as CLI should work without logging)
    let _ = init_logging(&log_config);

    // Execute command
    let result = execute_command(&cli).await;

    // Handle result
    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> dri_cli::Result<()> {
    // Command is guaranteed to exist at this point (checked in main)
    let Some(ref command) = cli.command else {
        unreachable!("Command should have been validated in main");
    };

    match command {
        Commands::Prep { manifest } => {
            dri_cli::commands::prep::run(cli.server_url.clone(), manifest.clone()).await
        },

        Commands::Ingest { manifest } => {
            dri_cli::commands::ingest::run(cli.server_url.clone(), manifest.clone()).await
        },
    }
}
