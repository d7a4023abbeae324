//! Write collector results as metric CSVs.
//!
//! One file per `CollectedMetric`, rows `epoch_seconds,value`, no header,
//! ascending by date. These are exactly the files the loader serves to the
//! chart, so they always use the epoch encoding.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;

use crate::domain::{CollectedMetric, DailyInfo, TimestampEncoding};
use crate::error::AppError;
use crate::io::ingest::transform;

/// Merge `days` into the per-metric CSVs under `dir` and return the written paths.
///
/// Rows already on disk are kept. A day present in `days` replaces the stored
/// row for that day.
pub fn write_daily_series(dir: &Path, days: &[DailyInfo]) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create output dir '{}': {e}", dir.display())))?;

    let mut written = Vec::with_capacity(CollectedMetric::ALL.len());
    for metric in CollectedMetric::ALL {
        let path = dir.join(metric.file_name());
        let mut rows = read_series(&path)?;

        for day in days {
            let ts = day.date.and_time(NaiveTime::MIN).and_utc().timestamp();
            rows.insert(ts, day.value(metric) as f64);
        }

        write_series(&path, &rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote {} series", metric.label());
        written.push(path);
    }

    Ok(written)
}

/// Read an existing series file keyed by epoch seconds (missing file = empty).
pub fn read_series(path: &Path) -> Result<BTreeMap<i64, f64>, AppError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(AppError::new(
                4,
                format!("Failed to read series '{}': {e}", path.display()),
            ));
        }
    };

    let points = transform(&raw, TimestampEncoding::Epoch).map_err(|e| {
        AppError::new(2, format!("Existing series '{}' is not valid: {e}", path.display()))
    })?;

    Ok(points
        .into_iter()
        .map(|p| (p.timestamp.timestamp(), p.value))
        .collect())
}

fn write_series(path: &Path, rows: &BTreeMap<i64, f64>) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create series '{}': {e}", path.display())))?;

    for (ts, value) in rows {
        writer
            .write_record([ts.to_string(), value.to_string()])
            .map_err(|e| AppError::new(4, format!("Failed to write series row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush series '{}': {e}", path.display())))?;
    Ok(())
}
