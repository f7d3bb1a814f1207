//! CLI module for docbatch
//!
//! Provides command-line interface for:
//! - run: iterate a JSON-lines collection with checkpointing and pacing
//! - checkpoint show: print the stored position
//! - checkpoint clear: forget the stored position

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{CheckpointAction, Cli, Command};
pub use commands::{clear_checkpoint, run, run_batch, run_command, show_checkpoint};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_document, write_json};
