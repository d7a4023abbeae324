//! Per-user cache of the last fetched events.
//!
//! A `304 Not Modified` answer carries no body, so the events behind a stored
//! ETag are kept here and re-used on the next run. Stored as a JSON array of
//! `{ "user": ..., "events": [...] }`, sorted by user.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct CacheEntry<T> {
    user: String,
    events: Vec<T>,
}

/// Read the cache into a `user -> events` map (missing file = empty map).
pub fn read_event_cache<T: DeserializeOwned>(path: &Path) -> Result<HashMap<String, Vec<T>>, AppError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(AppError::new(
                4,
                format!("Failed to read event cache '{}': {e}", path.display()),
            ));
        }
    };

    let entries: Vec<CacheEntry<T>> = serde_json::from_str(&raw)
        .map_err(|e| AppError::new(2, format!("Invalid event cache JSON '{}': {e}", path.display())))?;

    Ok(entries.into_iter().map(|e| (e.user, e.events)).collect())
}

pub fn write_event_cache<T: Serialize>(path: &Path, cache: &HashMap<String, Vec<T>>) -> Result<(), AppError> {
    let mut entries: Vec<(&String, &Vec<T>)> = cache.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let entries: Vec<CacheEntryRef<'_, T>> = entries
        .into_iter()
        .map(|(user, events)| CacheEntryRef { user, events })
        .collect();

    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create event cache '{}': {e}", path.display())))?;
    serde_json::to_writer(file, &entries)
        .map_err(|e| AppError::new(4, format!("Failed to write event cache: {e}")))?;
    Ok(())
}

#[derive(Serialize)]
struct CacheEntryRef<'a, T> {
    user: &'a str,
    events: &'a [T],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache: HashMap<String, Vec<u32>> = read_event_cache(&dir.path().join("cache.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_is_written_sorted_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = HashMap::new();
        cache.insert("zoe".to_string(), vec![3u32]);
        cache.insert("ana".to_string(), vec![1u32, 2]);
        write_event_cache(&path, &cache).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"[{"user":"ana","events":[1,2]},{"user":"zoe","events":[3]}]"#);
        assert_eq!(read_event_cache::<u32>(&path).unwrap(), cache);
    }

    #[test]
    fn rejects_malformed_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "[{").unwrap();
        assert_eq!(read_event_cache::<u32>(&path).unwrap_err().exit_code(), 2);
    }
}
