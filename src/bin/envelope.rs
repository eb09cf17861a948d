//! Envelope CLI
//!
//! Inspects configuration envelope files without needing codec bindings.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use configs_registry::EnvelopeCodec;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envelope")]
#[command(about = "Inspect configuration envelope files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the version and per-table record counts of an envelope
    Inspect {
        /// Path to the envelope file
        file: PathBuf,
    },

    /// Print the parsed version of an envelope
    Version {
        /// Path to the envelope file
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Inspect { file } => {
            let info = inspect(&file)?;
            println!("version: {} (label {:?})", info.version, info.version_label);
            if info.tables.is_empty() {
                println!("no tables");
            } else {
                for (tag, count) in &info.tables {
                    println!("  {tag}: {count} record(s)");
                }
            }
        }
        Commands::Version { file } => {
            let info = inspect(&file)?;
            println!("{}", info.version);
        }
    }

    Ok(())
}

fn inspect(file: &Path) -> anyhow::Result<configs_registry::EnvelopeInfo> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading envelope file {}", file.display()))?;
    EnvelopeCodec::inspect(&text).with_context(|| format!("parsing envelope {}", file.display()))
}
