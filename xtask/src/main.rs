//! Build automation tasks for DRI
//!
//! This tool provides various automation tasks for the DRI project, including:
//! - Generating CLI documentation from source code
//! - Future build-related tasks

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for DRI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate CLI documentation in MDX format
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    // Generate markdown from clap definitions
    let markdown = clap_markdown::help_markdown::<dri_cli::Cli>();

    // Create MDX content with frontmatter and enhanced formatting
    let mdx_content = format!(
        r#"---
title: CLI Reference
description: Complete command reference for the DRI CLI
---

# DRI CLI Reference

This documentation is auto-generated from the CLI source code. Last updated: {}.

## Overview

DRI (Digital Repository Ingest) is a command-line tool for batch ingesting
digital objects into a repository from manifest-described batch directories.

## Installation

### From Source

```bash
git clone https://github.com/datadir-lab/dri.git
cd dri
cargo install --path crates/dri-cli
```

## Quick Start

```bash
# Build the master document and QDC metadata files for a batch
dri prep batch/manifests/item_manifest.yaml

# Ingest the prepared batch into the repository
dri ingest batch/manifests/item_manifest.yaml

# Re-run safely: objects that already carry a PID are skipped
dri ingest batch/manifests/item_manifest.yaml
```

## Commands

{}

## Environment Variables

- `DRI_SERVER_URL` - Repository server URL (default: `http://localhost:8000`)
- `DRI_API_TIMEOUT_SECS` - Per-request timeout for repository API calls
- `LOG_LEVEL` - Logging level (e.g., `debug`, `info`, `warn`, `error`)

## Batch Manifest

A batch is described by a YAML manifest:

```yaml
basepath: /data/batches/photographs/
model: afmodel:Item
label: Photograph Collection
metadata:
  - marcxml
objects:
  - identifier: item_1
  - identifier:
      - item_2
      - item_3
    label: Second Object Label
    marcxml: second.xml
  - identifier: item_4
    parentid: coll_1
```

Metadata sources live under `<basepath>/<sourcename>/`; a bare filename in a
descriptor resolves there, a path is used as given, and an unnamed source
defaults to `<identifier>.xml`.

## Master Document

`dri prep` writes `<basepath>/master/master.xml` recording one node per
object. `dri ingest` writes each assigned PID back into that document right
after the object is saved, so an interrupted or partially failed run can be
resumed by running `dri ingest` again.

---

*This documentation is automatically generated from the CLI source code. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    // Create output directory if it doesn't exist
    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    // Write the MDX file
    let file_path = output_path.join("cli-reference.mdx");
    fs::write(&file_path, mdx_content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Review the generated documentation");
    println!("  2. Commit it to version control");
    println!("  3. Add a CI check to ensure docs stay in sync");

    Ok(())
}
