//! Record Reader collaborator: reads a collection of line-delimited JSON
//! records from a directory tree.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::EtlError;

/// Read every `*.json` file under `root` as line-delimited JSON and return
/// the records as raw values. Malformed lines are skipped with a warning;
/// file-level I/O failures abort the run.
pub fn read_json_collection(root: &Path) -> Result<Vec<Value>, EtlError> {
    let mut records = Vec::new();
    let mut files = 0usize;
    let mut malformed = 0usize;

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| EtlError::ReadFailed {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            continue;
        }

        let file = File::open(entry.path()).map_err(|e| EtlError::ReadFailed {
            path: entry.path().display().to_string(),
            message: e.to_string(),
        })?;
        files += 1;

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| EtlError::ReadFailed {
                path: entry.path().display().to_string(),
                message: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => records.push(value),
                Err(e) => {
                    warn!(
                        "Skipping malformed line in {}: {}",
                        entry.path().display(),
                        e
                    );
                    malformed += 1;
                }
            }
        }
    }

    info!(
        "Read {} records from {} files under {} ({} malformed lines skipped)",
        records.len(),
        files,
        root.display(),
        malformed
    );
    Ok(records)
}
