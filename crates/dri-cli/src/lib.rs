//! DRI CLI Library
//!
//! Command-line interface for the DRI batch ingest pipeline.
//!
//! # Overview
//!
//! The CLI drives the two pipeline phases over a batch manifest:
//!
//! - **Preparation**: build the master document and QDC files (`dri prep`)
//! - **Ingest**: create repository objects from a prepared batch (`dri ingest`)
//!
//! A batch can be prepared once and ingested any number of times; nodes that
//! already carry a PID in the master document are skipped on re-runs.

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// DRI - Digital Repository Ingest
#[derive(Parser, Debug)]
#[command(name = "dri")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository server URL
    #[arg(
        long,
        env = "DRI_SERVER_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub server_url: String,

    /// Print help as markdown (for documentation generation)
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare a batch for ingest: build the master document and QDC files
    Prep {
        /// Path to the batch manifest (YAML)
        manifest: String,
    },

    /// Ingest a prepared batch into the repository
    Ingest {
        /// Path to the batch manifest (YAML)
        manifest: String,
    },
}
