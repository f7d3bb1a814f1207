//! JSON output for the CLI
//!
//! - stdout: one JSON object per line, nothing else
//! - stderr: logs and the final summary

use std::io::Write;

use serde_json::{json, Value};

use super::errors::CliResult;

/// Writes one delivered document:
/// `{"ordinal":n,"total":t|null,"document":{...}}`
pub fn write_document<W: Write>(
    out: &mut W,
    document: &Value,
    ordinal: u64,
    total: Option<u64>,
) -> CliResult<()> {
    let line = json!({
        "ordinal": ordinal,
        "total": total,
        "document": document,
    });
    serde_json::to_writer(&mut *out, &line)?;
    writeln!(out)?;
    Ok(())
}

/// Write a single JSON value as one line
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
