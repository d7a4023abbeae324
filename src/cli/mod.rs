//! Command-line parsing for the activity timeline viewer.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! loading, charting and collection code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::github::DEFAULT_API_BASE;
use crate::domain::{TickInterval, TimestampEncoding};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vibe", version, about = "Organization push activity on a timeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load one metric and draw it to an SVG file (or the terminal with `--ascii`).
    Render(RenderArgs),
    /// Launch the interactive TUI: pick a metric, see its timeline.
    Tui(TuiArgs),
    /// Collect push activity of a GitHub organization into the metric CSVs.
    Collect(CollectArgs),
}

/// Where metric CSVs come from and how they are read and charted.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Directory holding the metric CSVs, or an http(s) base URL serving them.
    #[arg(short = 's', long, value_name = "DIR|URL", default_value = ".")]
    pub source: String,

    /// HTTP request timeout (seconds).
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Encoding of the timestamp column.
    #[arg(long, value_enum, default_value_t = TimestampEncoding::Epoch)]
    pub encoding: TimestampEncoding,

    /// Spacing of x-axis ticks (e.g. `1 week`, `3 days`, `2w`).
    #[arg(long, default_value_t = TickInterval::default())]
    pub tick: TickInterval,

    /// Metric label offered for selection (repeatable). The first is the default.
    #[arg(short = 'm', long = "metric", value_name = "LABEL")]
    pub metrics: Vec<String>,

    /// Disable point markers / the point inspector.
    #[arg(long)]
    pub no_highlight: bool,
}

/// Options for one-shot rendering.
#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Metric to render (defaults to the first metric option).
    #[arg(value_name = "LABEL")]
    pub label: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// SVG output file.
    #[arg(short = 'o', long, default_value = "timeline.svg")]
    pub out: PathBuf,

    /// Print a text chart instead of writing an SVG.
    #[arg(long)]
    pub ascii: bool,

    /// Chart width (pixels for SVG, columns for `--ascii`).
    #[arg(long)]
    pub width: Option<u32>,

    /// Chart height (pixels for SVG, rows for `--ascii`).
    #[arg(long)]
    pub height: Option<u32>,
}

/// Options for the interactive UI.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Log file (the terminal is owned by the UI).
    #[arg(long, default_value = "vibe.log")]
    pub log_file: PathBuf,
}

/// Options for the collector.
#[derive(Debug, Args, Clone)]
pub struct CollectArgs {
    /// GitHub organization to poll.
    #[arg(long)]
    pub org: String,

    /// GitHub API base URL.
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api: String,

    /// Directory the metric CSVs are written to.
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// JSON file holding the per-user ETags.
    #[arg(long, default_value = "etags.json")]
    pub etags: PathBuf,

    /// JSON file caching each member's last fetched events.
    #[arg(long, default_value = "events-cache.json")]
    pub cache: PathBuf,

    /// HTTP request timeout (seconds).
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Keep running and collect every `--interval-hours`.
    #[arg(long)]
    pub watch: bool,

    #[arg(long, default_value_t = 24)]
    pub interval_hours: u64,
}
