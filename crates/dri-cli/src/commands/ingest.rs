//! `dri ingest` command implementation
//!
//! Walks the master document of a prepared batch and ingests every object
//! that does not carry a PID yet. Partial success is an accepted outcome;
//! the command prints the per-object report and leaves failed objects
//! eligible for the next run.

use crate::error::Result;
use colored::Colorize;
use dri_ingest::config::IngestConfig;
use dri_ingest::orchestrator::{IngestOrchestrator, ObjectOutcome};
use dri_ingest::repository::HttpRepository;
use std::sync::Arc;

/// Ingest a prepared batch into the repository
pub async fn run(server_url: String, manifest: String) -> Result<()> {
    let repository = Arc::new(HttpRepository::new(server_url)?);
    let orchestrator = IngestOrchestrator::new(repository, IngestConfig::default());

    println!("{} Ingesting batch from {}...", "→".cyan(), manifest);

    let report = orchestrator.ingest(&manifest).await?;

    for entry in &report.objects {
        match &entry.outcome {
            ObjectOutcome::Ingested { pid } => {
                println!("{} {} ({})", "✓".green(), entry.identifier, pid);
            },
            ObjectOutcome::Skipped { pid } => {
                println!(
                    "{} {} (already ingested: {})",
                    "✓".green(),
                    entry.identifier,
                    pid
                );
            },
            ObjectOutcome::Failed { reason } => {
                println!("{} {}: {}", "✗".red(), entry.identifier, reason);
            },
        }
    }

    println!();
    let summary = format!(
        "{} ingested, {} skipped, {} failed",
        report.ingested(),
        report.skipped(),
        report.failed()
    );
    if report.failed() == 0 {
        println!("{} {}", "✓".green().bold(), summary);
    } else {
        println!("{} {}", "!".yellow().bold(), summary);
        println!("Failed objects keep no PID in the master document; run 'dri ingest' again to retry them.");
    }

    Ok(())
}
