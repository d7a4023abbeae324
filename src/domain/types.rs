//! Shared domain types.
//!
//! These types are intentionally small and cheap to clone: a load rebuilds
//! everything from scratch, nothing here is persisted across loads.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::ValueEnum;

/// How the first CSV column encodes time.
///
/// The encoding is fixed per deployment; it is never guessed from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TimestampEncoding {
    /// Unix timestamp in whole seconds (e.g. `1214913600`).
    #[default]
    Epoch,
    /// Calendar date/time string (e.g. `2008-06-30 8:00AM`).
    Date,
}

impl TimestampEncoding {
    pub fn expected(self) -> &'static str {
        match self {
            Self::Epoch => "expected whole Unix epoch seconds",
            Self::Date => "expected a date such as `2008-06-30 8:00AM` or `2008-06-30`",
        }
    }
}

/// One chart point: a display timestamp and the metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPoint {
    pub timestamp: DateTime<Utc>,
    /// Human-readable UTC form of `timestamp` (e.g. `Tue, 01 Jul 2008 12:00:00 GMT`).
    pub display: String,
    pub value: f64,
}

impl ParsedPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            display: display_timestamp(timestamp),
            value,
        }
    }
}

/// Format a timestamp the way HTTP dates are written (`%a, %d %b %Y %H:%M:%S GMT`).
pub fn display_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Map a selection label to the CSV resource it names (`Commits` -> `commits.csv`).
pub fn resource_name(label: &str) -> String {
    format!("{}.csv", label.trim().to_lowercase())
}

/// Spacing of the x-axis ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickInterval {
    Days(u32),
    Weeks(u32),
}

impl TickInterval {
    pub fn duration(self) -> Duration {
        match self {
            Self::Days(n) => Duration::days(i64::from(n)),
            Self::Weeks(n) => Duration::weeks(i64::from(n)),
        }
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        Self::Weeks(1)
    }
}

impl fmt::Display for TickInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Days(1) => write!(f, "1 day"),
            Self::Days(n) => write!(f, "{n} days"),
            Self::Weeks(1) => write!(f, "1 week"),
            Self::Weeks(n) => write!(f, "{n} weeks"),
        }
    }
}

impl FromStr for TickInterval {
    type Err = String;

    /// Accepts `1 week`, `2 weeks`, `3 days`, `1w`, `10d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let split_idx = s.chars().take_while(|c| c.is_ascii_digit()).count();
        if split_idx == 0 {
            return Err(format!("Invalid tick interval '{s}'. Examples: 1 week, 2 weeks, 3 days, 1w, 7d"));
        }

        let amount: u32 = s[..split_idx]
            .parse()
            .map_err(|_| format!("Invalid tick interval amount in '{s}'"))?;
        if amount == 0 {
            return Err("Tick interval must be at least 1.".to_string());
        }

        match s[split_idx..].trim() {
            "w" | "week" | "weeks" => Ok(Self::Weeks(amount)),
            "d" | "day" | "days" => Ok(Self::Days(amount)),
            unit => Err(format!("Unknown tick interval unit '{unit}'. Use: week(s), day(s), w, d")),
        }
    }
}

/// Fixed display configuration applied to every chart instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub tick_interval: TickInterval,
    /// Lower bound of the y-axis.
    pub y_min: f64,
    pub y_label: String,
    /// Enable the point highlighter (marker + inspector).
    pub highlight: bool,
    /// Marker size for highlighted points, in pixels.
    pub highlight_size: u32,
    /// Space reserved on the right so the last point's marker is not clipped.
    pub right_padding: u32,
    /// Output size for image surfaces.
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            tick_interval: TickInterval::default(),
            y_min: 0.0,
            y_label: String::new(),
            highlight: true,
            highlight_size: 6,
            right_padding: 35,
            width: 960,
            height: 400,
        }
    }
}

/// Settings for one collector run.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// GitHub organization whose members are polled.
    pub org: String,
    pub api_base: String,
    /// Directory the metric CSVs are written to.
    pub output_dir: PathBuf,
    pub etags_path: PathBuf,
    /// Last fetched events per member, re-used when a fetch answers `304`.
    pub cache_path: PathBuf,
    pub timeout: StdDuration,
    /// Keep running, collecting every `interval`.
    pub watch: bool,
    pub interval: StdDuration,
}

/// The series written by the collector, one CSV each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectedMetric {
    Commits,
    Pushes,
    Users,
}

impl CollectedMetric {
    pub const ALL: [CollectedMetric; 3] = [Self::Commits, Self::Pushes, Self::Users];

    pub fn label(self) -> &'static str {
        match self {
            Self::Commits => "Commits",
            Self::Pushes => "Pushes",
            Self::Users => "Users",
        }
    }

    pub fn file_name(self) -> String {
        resource_name(self.label())
    }
}

/// Push activity aggregated over one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyInfo {
    pub date: NaiveDate,
    /// Sum of commits over all pushes of the day.
    pub commits: u64,
    pub pushes: u64,
    /// Distinct users that pushed on the day.
    pub users: u64,
}

impl DailyInfo {
    pub fn value(&self, metric: CollectedMetric) -> u64 {
        match metric {
            CollectedMetric::Commits => self.commits,
            CollectedMetric::Pushes => self.pushes,
            CollectedMetric::Users => self.users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resource_name_lowercases_label() {
        assert_eq!(resource_name("Commits"), "commits.csv");
        assert_eq!(resource_name(" Users "), "users.csv");
        assert_eq!(CollectedMetric::Pushes.file_name(), "pushes.csv");
    }

    #[test]
    fn display_timestamp_is_utc_http_style() {
        let ts = Utc.with_ymd_and_hms(2008, 7, 1, 12, 0, 0).unwrap();
        assert_eq!(display_timestamp(ts), "Tue, 01 Jul 2008 12:00:00 GMT");
    }

    #[test]
    fn tick_interval_parses_common_forms() {
        assert_eq!("1 week".parse::<TickInterval>().unwrap(), TickInterval::Weeks(1));
        assert_eq!("2 weeks".parse::<TickInterval>().unwrap(), TickInterval::Weeks(2));
        assert_eq!("10d".parse::<TickInterval>().unwrap(), TickInterval::Days(10));
        assert_eq!("1W".parse::<TickInterval>().unwrap(), TickInterval::Weeks(1));
        assert!("0 weeks".parse::<TickInterval>().is_err());
        assert!("weekly".parse::<TickInterval>().is_err());
        assert!("3 months".parse::<TickInterval>().is_err());
    }

    #[test]
    fn default_chart_config_is_weekly_from_zero() {
        let cfg = ChartConfig::default();
        assert_eq!(cfg.tick_interval, TickInterval::Weeks(1));
        assert_eq!(cfg.tick_interval.duration(), Duration::days(7));
        assert_eq!(cfg.y_min, 0.0);
        assert!(cfg.y_label.is_empty());
        assert!(cfg.highlight);
    }
}
