//! Metric option discovery.
//!
//! The selection control offers one label per metric. Labels come from, in
//! order of preference:
//! - explicit `--metric` flags
//! - the `*.csv` files of a local source directory
//! - the collector's built-in metrics (`Commits`, `Pushes`, `Users`)
//!
//! A discovered file is only offered when its label maps back to the same file
//! name, so every option is loadable.

use std::fs;
use std::path::Path;

use crate::cli::SourceArgs;
use crate::domain::{CollectedMetric, resource_name};
use crate::load::Source;

/// Option labels for the selection control; never empty.
pub fn metric_options(args: &SourceArgs, source: &Source) -> Vec<String> {
    let explicit: Vec<String> = args
        .metrics
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if !explicit.is_empty() {
        return explicit;
    }

    if let Some(file) = source.as_file() {
        let found = discover_metric_labels(file.root());
        if !found.is_empty() {
            tracing::debug!(count = found.len(), dir = %file.root().display(), "discovered metric files");
            return found;
        }
    }

    default_metric_labels()
}

pub fn default_metric_labels() -> Vec<String> {
    CollectedMetric::ALL.iter().map(|m| m.label().to_string()).collect()
}

/// Labels of the `*.csv` files directly inside `dir` (sorted).
pub fn discover_metric_labels(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
        if !is_file
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                != Some(true)
        {
            continue;
        }

        let (Some(stem), Some(file_name)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.file_name().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        let label = label_for(stem);
        if resource_name(&label) == file_name {
            out.push(label);
        }
    }

    out.sort();
    out
}

/// `commits` -> `Commits`.
fn label_for(stem: &str) -> String {
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
