//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging and the async runtime
//! - dispatches to rendering, the TUI or the collector

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::chart::SvgSurface;
use crate::cli::{CollectArgs, Command, RenderArgs, SourceArgs, TuiArgs};
use crate::controller::Outcome;
use crate::data::{GithubClient, collect_once};
use crate::domain::{ChartConfig, CollectConfig};
use crate::error::AppError;
use crate::load::Source;
use crate::plot::AsciiSurface;

pub mod pipeline;

const DEFAULT_LOG_FILTER: &str = "vibe=info";

/// Text chart size used when `--ascii` is given without `--width`/`--height`.
const ASCII_WIDTH: u32 = 100;
const ASCII_HEIGHT: u32 = 25;

/// Entry point for the `vibe` binary.
pub fn run() -> Result<(), AppError> {
    // `vibe` and `vibe -s data/` behave like `vibe tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Tui(args) => handle_tui(args),
        Command::Collect(args) => handle_collect(args),
    }
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    init_tracing_stderr();

    let mut config = chart_config(&args.source);
    let source = Source::parse(&args.source.source, Duration::from_secs(args.source.timeout))?;
    let label = match &args.label {
        Some(label) => label.clone(),
        None => crate::cli::picker::metric_options(&args.source, &source)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::new(2, "No metric to render. Pass one with `vibe render <LABEL>`."))?,
    };

    let runtime = build_runtime()?;
    let outcome = if args.ascii {
        let width = args.width.unwrap_or(ASCII_WIDTH) as usize;
        let height = args.height.unwrap_or(ASCII_HEIGHT) as usize;
        let out = runtime.block_on(pipeline::render_metric(
            source,
            AsciiSurface::new(width, height),
            config.clone(),
            args.source.encoding,
            &label,
        ))?;

        println!("{}", crate::report::format_outcome(&out.label, &out.outcome, &config));
        if let Some(chart) = out.chart {
            println!("{}", chart.text);
        }
        out.outcome
    } else {
        if let Some(width) = args.width {
            config.width = width;
        }
        if let Some(height) = args.height {
            config.height = height;
        }
        let out = runtime.block_on(pipeline::render_metric(
            source,
            SvgSurface::new(&args.out),
            config.clone(),
            args.source.encoding,
            &label,
        ))?;

        println!("{}", crate::report::format_outcome(&out.label, &out.outcome, &config));
        if let Some(chart) = out.chart {
            println!("Wrote {}", chart.path.display());
        }
        out.outcome
    };

    match outcome {
        Outcome::Bound { .. } => Ok(()),
        Outcome::NotDelivered { resource } => Err(AppError::new(
            3,
            format!("Nothing rendered: {resource} could not be retrieved."),
        )),
    }
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    init_tracing_file(&args)?;

    // The UI loop is synchronous; loads run on the runtime's worker threads.
    let runtime = build_runtime()?;
    let _enter = runtime.enter();
    crate::tui::run(args)
}

fn handle_collect(args: CollectArgs) -> Result<(), AppError> {
    init_tracing_stderr();

    let config = collect_config(&args);
    let runtime = build_runtime()?;
    runtime.block_on(collect_loop(config))
}

async fn collect_loop(config: CollectConfig) -> Result<(), AppError> {
    let client = Arc::new(GithubClient::from_env(&config.api_base, config.timeout)?);

    loop {
        match collect_once(Arc::clone(&client), &config).await {
            Ok(summary) => println!("{}", crate::report::format_collect_summary(&summary, &config)),
            Err(err) if config.watch => {
                tracing::warn!(error = %err, "collection failed; retrying at the next interval");
            }
            Err(err) => return Err(err),
        }

        if !config.watch {
            return Ok(());
        }

        tracing::info!(hours = config.interval.as_secs() / 3600, "waiting for the next collection");
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            res = tokio::signal::ctrl_c() => {
                res.map_err(|e| AppError::new(4, format!("Failed to listen for Ctrl-C: {e}")))?;
                tracing::info!("interrupted; collector stopped");
                return Ok(());
            }
        }
    }
}

pub fn chart_config(args: &SourceArgs) -> ChartConfig {
    ChartConfig {
        tick_interval: args.tick,
        highlight: !args.no_highlight,
        ..ChartConfig::default()
    }
}

pub fn collect_config(args: &CollectArgs) -> CollectConfig {
    CollectConfig {
        org: args.org.clone(),
        api_base: args.api.clone(),
        output_dir: args.output_dir.clone(),
        etags_path: args.etags.clone(),
        cache_path: args.cache.clone(),
        timeout: Duration::from_secs(args.timeout),
        watch: args.watch,
        interval: Duration::from_secs(args.interval_hours.max(1) * 3600),
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing_stderr() {
    // Fails only if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The TUI owns the terminal, so its logs go to a file.
fn init_tracing_file(args: &TuiArgs) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.log_file)
        .map_err(|e| {
            AppError::new(
                2,
                format!("Failed to open log file {}: {e}", args.log_file.display()),
            )
        })?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Rewrite argv so `vibe` defaults to `vibe tui`.
///
/// Rules:
/// - `vibe`                      -> `vibe tui`
/// - `vibe -s data/ ...`         -> `vibe tui -s data/ ...`
/// - `vibe --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "render" | "tui" | "collect");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["vibe"])), argv(&["vibe", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["vibe", "-s", "data"])),
            argv(&["vibe", "tui", "-s", "data"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["vibe", "render", "Commits"]),
            argv(&["vibe", "collect", "--org", "acme"]),
            argv(&["vibe", "--help"]),
            argv(&["vibe", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn chart_config_follows_flags() {
        let cli = crate::cli::Cli::parse_from(["vibe", "render", "--tick", "2 weeks", "--no-highlight"]);
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        let config = chart_config(&args.source);
        assert_eq!(config.tick_interval, crate::domain::TickInterval::Weeks(2));
        assert!(!config.highlight);
        assert_eq!(config.y_min, 0.0);
        assert_eq!(config.right_padding, 35);
    }

    #[test]
    fn collect_interval_is_in_hours() {
        let cli = crate::cli::Cli::parse_from(["vibe", "collect", "--org", "acme", "--interval-hours", "6"]);
        let Command::Collect(args) = cli.command else {
            panic!("expected collect");
        };
        let config = collect_config(&args);
        assert_eq!(config.interval, Duration::from_secs(6 * 3600));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.watch);
        assert_eq!(config.cache_path, std::path::PathBuf::from("events-cache.json"));
    }
}
