//! CLI command implementations
//!
//! Thin shims: load the config file, build sources and stores, hand over to
//! the library. Document output goes to the writer passed in (stdout in
//! production).

use std::io::{self, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::batch::{BatchIterator, RunError};
use crate::checkpoint::CheckpointCoordinator;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::source::JsonLinesSource;

use super::args::{CheckpointAction, Command};
use super::config::Config;
use super::errors::CliResult;
use super::io::{write_document, write_json};

/// Main entry point for the CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cmd {
        Command::Run { config } => {
            let processed = run_batch(&config, &mut out)?;
            eprintln!("processed {} documents", processed);
            Ok(())
        }
        Command::Checkpoint { action } => match action {
            CheckpointAction::Show { config } => show_checkpoint(&config, &mut out),
            CheckpointAction::Clear { config } => clear_checkpoint(&config, &mut out),
        },
    }
}

fn load_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    Logger::set_min_severity(config.severity()?);
    let path = path.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);
    Ok(config)
}

/// Iterates the configured collection, one line per document on `out`.
///
/// Returns the number of documents processed.
pub fn run_batch<W: Write>(config_path: &Path, out: &mut W) -> CliResult<u64> {
    let config = load_config(config_path)?;
    let source = JsonLinesSource::open(&config.source)?;

    let mut iterator = BatchIterator::new(source)
        .with_config(config.to_batch_config()?)
        .with_checkpoint_store(config.checkpoint_store());

    let result = iterator.execute(|document, ordinal, total| {
        write_document(&mut *out, document, ordinal, total)
    });
    out.flush()?;

    match result {
        Ok(processed) => Ok(processed),
        Err(RunError::Batch(e)) => Err(e.into()),
        Err(RunError::Callback(e)) => Err(e),
    }
}

/// Prints the stored checkpoint value, or `null`
pub fn show_checkpoint<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    let config = load_config(config_path)?;
    let batch = config.to_batch_config()?;
    let spec = batch.validate_for_run()?;

    let coordinator =
        CheckpointCoordinator::for_config(Some(config.require_checkpoint_store()?), &batch, spec);
    let value = coordinator
        .current()?
        .map(|checkpoint| checkpoint.value)
        .unwrap_or(Value::Null);
    write_json(out, &value)
}

/// Deletes the stored checkpoint and reports whether one existed
pub fn clear_checkpoint<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    let config = load_config(config_path)?;
    let batch = config.to_batch_config()?;
    let spec = batch.validate_for_run()?;

    let coordinator =
        CheckpointCoordinator::for_config(Some(config.require_checkpoint_store()?), &batch, spec);
    let removed = coordinator.clear()?;
    write_json(
        out,
        &json!({"key": coordinator.key().as_str(), "removed": removed}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // =========================================================================
    // Helper Functions
    // =========================================================================

    fn setup(dir: &TempDir, extra: Value) -> PathBuf {
        let lines: Vec<String> = (1..=5)
            .map(|i| json!({"_id": i, "name": format!("user{}", i)}).to_string())
            .collect();
        fs::write(dir.path().join("users.jsonl"), lines.join("\n")).unwrap();

        let mut config = json!({
            "source": "users.jsonl",
            "checkpoint_file": "checkpoints.json",
            "iteration_field": "_id",
            "calc_count": false,
            "log_level": "error"
        });
        if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        let path = dir.path().join("docbatch.json");
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    fn output_lines(buf: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(buf)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_run_writes_one_line_per_document() {
        let dir = TempDir::new().unwrap();
        let path = setup(&dir, json!({}));

        let mut out = Vec::new();
        assert_eq!(run_batch(&path, &mut out).unwrap(), 5);

        let lines = output_lines(&out);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["ordinal"], 1);
        assert!(lines[0]["total"].is_null());
        assert_eq!(lines[4]["document"]["_id"], 5);
    }

    #[test]
    fn test_run_resumes_from_checkpoint_file() {
        let dir = TempDir::new().unwrap();
        let path = setup(&dir, json!({"save_state": true, "limit": 2}));

        let mut out = Vec::new();
        run_batch(&path, &mut out).unwrap();

        let mut shown = Vec::new();
        show_checkpoint(&path, &mut shown).unwrap();
        assert_eq!(output_lines(&shown), vec![json!(2)]);

        let mut out = Vec::new();
        run_batch(&path, &mut out).unwrap();
        let ids: Vec<Value> = output_lines(&out)
            .iter()
            .map(|l| l["document"]["_id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(3), json!(4)]);
    }

    #[test]
    fn test_clear_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = setup(&dir, json!({"save_state": true}));
        run_batch(&path, &mut Vec::new()).unwrap();

        let mut out = Vec::new();
        clear_checkpoint(&path, &mut out).unwrap();
        assert_eq!(
            output_lines(&out),
            vec![json!({"key": "docbatch:_id:1", "removed": true})]
        );

        let mut shown = Vec::new();
        show_checkpoint(&path, &mut shown).unwrap();
        assert_eq!(output_lines(&shown), vec![Value::Null]);
    }

    #[test]
    fn test_malformed_document_fails_run() {
        let dir = TempDir::new().unwrap();
        let path = setup(&dir, json!({}));
        fs::write(
            dir.path().join("users.jsonl"),
            "{\"_id\": 1}\n{\"_id\": \"\"}\n",
        )
        .unwrap();

        let mut out = Vec::new();
        let err = run_batch(&path, &mut out).unwrap_err();
        assert_eq!(err.code_str(), "DOCBATCH_CLI_RUN_FAILED");
        assert_eq!(output_lines(&out).len(), 1);
    }

    #[test]
    fn test_missing_collection_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = setup(&dir, json!({"source": "absent.jsonl"}));
        let err = run_batch(&path, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code_str(), "DOCBATCH_CLI_IO_ERROR");
    }

    #[test]
    fn test_show_requires_checkpoint_file() {
        let dir = TempDir::new().unwrap();
        let path = setup(&dir, json!({"checkpoint_file": null}));
        let err = show_checkpoint(&path, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code_str(), "DOCBATCH_CLI_CONFIG_ERROR");
    }
}
