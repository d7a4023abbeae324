//! Per-user ETag store for conditional event fetches.
//!
//! Stored as a pretty JSON array of `{ "user": ..., "etag": ... }`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EtagEntry {
    user: String,
    etag: String,
}

/// Read the store into a `user -> etag` map (missing file = empty map).
pub fn read_etags(path: &Path) -> Result<HashMap<String, String>, AppError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(AppError::new(
                4,
                format!("Failed to read etags '{}': {e}", path.display()),
            ));
        }
    };

    let entries: Vec<EtagEntry> = serde_json::from_str(&raw)
        .map_err(|e| AppError::new(2, format!("Invalid etags JSON '{}': {e}", path.display())))?;

    Ok(entries.into_iter().map(|e| (e.user, e.etag)).collect())
}

/// Write the store, sorted by user so the file diffs cleanly.
pub fn write_etags(path: &Path, etags: &HashMap<String, String>) -> Result<(), AppError> {
    let mut entries: Vec<EtagEntry> = etags
        .iter()
        .map(|(user, etag)| EtagEntry {
            user: user.clone(),
            etag: etag.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.user.cmp(&b.user));

    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create etags '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &entries)
        .map_err(|e| AppError::new(4, format!("Failed to write etags: {e}")))?;
    Ok(())
}
