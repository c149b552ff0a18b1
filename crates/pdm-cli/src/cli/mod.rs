//! CLI for the PDM download manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pdm_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_config, run_get, GetArgs};

/// Top-level CLI for the PDM download manager.
#[derive(Debug, Parser)]
#[command(name = "pdm")]
#[command(about = "PDM: resumable parallel HTTP download manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs, splitting large files into parallel ranges.
    Get {
        /// HTTP/HTTPS URLs to download.
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
        /// Directory to save into (default: current directory).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
        /// Worker threads (default: config, else available parallelism).
        #[arg(long, value_name = "N")]
        threads: Option<usize>,
        /// Expected SHA-256 of the file (single URL only).
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Show the config file location and effective settings.
    Config,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                urls,
                download_dir,
                threads,
                sha256,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let download_dir = match download_dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_get(
                    cfg,
                    GetArgs {
                        urls,
                        download_dir,
                        threads,
                        sha256,
                    },
                )?
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
            CliCommand::Config => run_config(&config::load_or_init()?)?,
        }

        Ok(())
    }
}
