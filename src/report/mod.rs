//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so output changes stay localized and
//! the loading/charting code stays free of presentation details.

use crate::chart::format_value;
use crate::controller::Outcome;
use crate::data::CollectSummary;
use crate::domain::{ChartConfig, CollectConfig, CollectedMetric, display_timestamp};

/// Summary of one load-and-bind cycle.
pub fn format_outcome(label: &str, outcome: &Outcome, config: &ChartConfig) -> String {
    let mut out = String::new();

    match outcome {
        Outcome::Bound {
            resource,
            points,
            stats,
        } => {
            out.push_str(&format!("=== vibe - {label} ({resource}) ===\n"));
            match stats {
                Some(stats) => {
                    out.push_str(&format!(
                        "Points: n={points} | {} .. {}\n",
                        display_timestamp(stats.first),
                        display_timestamp(stats.last)
                    ));
                    out.push_str(&format!(
                        "Values: [{}, {}]\n",
                        format_value(stats.value_min),
                        format_value(stats.value_max)
                    ));
                }
                None => out.push_str("Points: n=0 (empty series)\n"),
            }
            out.push_str(&format!("Ticks: every {}\n", config.tick_interval));
        }
        Outcome::NotDelivered { resource } => {
            out.push_str(&format!("=== vibe - {label} ({resource}) ===\n"));
            out.push_str("No data delivered; nothing rendered.\n");
        }
    }

    out
}

/// Summary of one collector run.
pub fn format_collect_summary(summary: &CollectSummary, config: &CollectConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== vibe collect - {} ===\n", config.org));
    out.push_str(&format!(
        "Members: {} | fresh={} not-modified={} failed={}\n",
        summary.members, summary.fresh, summary.not_modified, summary.failed
    ));
    out.push_str(&format!("Events: {} | days={}\n", summary.events, summary.days.len()));

    if !summary.days.is_empty() {
        out.push_str(
            format!(
                "{:<12} {:>8} {:>8} {:>8}\n",
                "date",
                CollectedMetric::Commits.label(),
                CollectedMetric::Pushes.label(),
                CollectedMetric::Users.label()
            )
            .trim_end(),
        );
        out.push('\n');
        for day in &summary.days {
            out.push_str(&format!(
                "{:<12} {:>8} {:>8} {:>8}\n",
                day.date.format("%Y-%m-%d").to_string(),
                day.commits,
                day.pushes,
                day.users
            ));
        }
    }

    for path in &summary.written {
        out.push_str(&format!("Wrote {}\n", path.display()));
    }

    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::domain::DailyInfo;
    use crate::io::ingest::SeriesStats;

    #[test]
    fn bound_outcome_lists_range_and_values() {
        let outcome = Outcome::Bound {
            resource: "commits.csv".to_string(),
            points: 2,
            stats: Some(SeriesStats {
                n_points: 2,
                first: Utc.with_ymd_and_hms(2008, 7, 1, 12, 0, 0).unwrap(),
                last: Utc.with_ymd_and_hms(2008, 7, 8, 12, 0, 0).unwrap(),
                value_min: 5.7,
                value_max: 6.5,
            }),
        };

        let text = format_outcome("Commits", &outcome, &ChartConfig::default());
        assert_eq!(
            text,
            "=== vibe - Commits (commits.csv) ===\n\
             Points: n=2 | Tue, 01 Jul 2008 12:00:00 GMT .. Tue, 08 Jul 2008 12:00:00 GMT\n\
             Values: [5.7, 6.5]\n\
             Ticks: every 1 week\n"
        );
    }

    #[test]
    fn undelivered_outcome_says_so() {
        let outcome = Outcome::NotDelivered {
            resource: "users.csv".to_string(),
        };
        let text = format_outcome("Users", &outcome, &ChartConfig::default());
        assert!(text.contains("(users.csv)"));
        assert!(text.contains("nothing rendered"));
    }

    #[test]
    fn collect_summary_has_one_row_per_day() {
        let config = CollectConfig {
            org: "acme".to_string(),
            api_base: "https://api.github.com".to_string(),
            output_dir: PathBuf::from("."),
            etags_path: PathBuf::from("etags.json"),
            cache_path: PathBuf::from("events-cache.json"),
            timeout: Duration::from_secs(30),
            watch: false,
            interval: Duration::from_secs(3600),
        };
        let summary = CollectSummary {
            members: 3,
            fresh: 2,
            not_modified: 1,
            events: 4,
            days: vec![DailyInfo {
                date: NaiveDate::from_ymd_opt(2008, 7, 1).unwrap(),
                commits: 7,
                pushes: 3,
                users: 2,
            }],
            written: vec![PathBuf::from("commits.csv")],
            ..CollectSummary::default()
        };

        let text = format_collect_summary(&summary, &config);
        assert!(text.starts_with("=== vibe collect - acme ===\n"));
        assert!(text.contains("fresh=2 not-modified=1 failed=0"));
        assert!(text.contains("2008-07-01"));
        assert!(text.contains("Wrote commits.csv"));
    }
}
