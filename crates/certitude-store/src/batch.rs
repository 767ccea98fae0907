//! Batch list input and batch result output.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::StoreError;

/// Default output file for batch results.
pub const DEFAULT_BATCH_OUTPUT: &str = "batch_results.json";

/// Parse a batch list: one path per line, first comma-separated column,
/// blank lines skipped. Plain path lists and single-column CSVs both work.
/// A double-quoted first column may contain commas and `""` escapes.
pub fn parse_batch_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let first = first_column(line);
            let first = first.trim();
            (!first.is_empty()).then(|| first.to_string())
        })
        .collect()
}

fn first_column(line: &str) -> String {
    let line = line.trim_start();
    let Some(quoted) = line.strip_prefix('"') else {
        return line.split(',').next().unwrap_or_default().to_string();
    };
    let mut out = String::new();
    let mut chars = quoted.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if chars.peek() == Some(&'"') => {
                chars.next();
                out.push('"');
            }
            '"' => break,
            other => out.push(other),
        }
    }
    out
}

/// Read and parse the batch list at `path`.
pub fn read_batch_list(path: &Path) -> Result<Vec<String>, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    Ok(parse_batch_list(&contents))
}

/// Write `results` as a pretty-printed JSON array. Callers redact first.
pub fn write_batch_results<T: Serialize>(path: &Path, results: &[T]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json).map_err(|e| StoreError::io(path, e))?;
    info!(path = %path.display(), count = results.len(), "batch results written");
    Ok(())
}
