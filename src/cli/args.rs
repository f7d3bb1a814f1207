//! CLI argument definitions using clap
//!
//! Commands:
//! - docbatch run --config <path>
//! - docbatch checkpoint show --config <path>
//! - docbatch checkpoint clear --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docbatch - resumable, paced batch iteration over a document collection
#[derive(Parser, Debug)]
#[command(name = "docbatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Iterate the configured collection, one JSON line per document on stdout
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./docbatch.json")]
        config: PathBuf,
    },

    /// Inspect or reset the stored checkpoint
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CheckpointAction {
    /// Print the stored checkpoint value, or null
    Show {
        /// Path to configuration file
        #[arg(long, default_value = "./docbatch.json")]
        config: PathBuf,
    },

    /// Delete the stored checkpoint
    Clear {
        /// Path to configuration file
        #[arg(long, default_value = "./docbatch.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
