//! `dri prep` command implementation
//!
//! Builds the master document and per-object QDC files for a batch.

use crate::error::Result;
use colored::Colorize;
use dri_ingest::config::IngestConfig;
use dri_ingest::orchestrator::IngestOrchestrator;
use dri_ingest::repository::HttpRepository;
use std::sync::Arc;

/// Prepare a batch for ingest
pub async fn run(server_url: String, manifest: String) -> Result<()> {
    let repository = Arc::new(HttpRepository::new(server_url)?);
    let orchestrator = IngestOrchestrator::new(repository, IngestConfig::default());

    println!("{} Preparing batch from {}...", "→".cyan(), manifest);

    let report = orchestrator.prep_for_ingest(&manifest).await?;

    println!("{} Prepared {} object(s)", "✓".green(), report.objects);
    println!("Master document: {}", report.master_path.display());

    Ok(())
}
