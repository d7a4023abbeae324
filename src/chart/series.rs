//! Surface-independent chart preparation.
//!
//! Every surface draws from a `TimelineSeries`: x is epoch seconds, y is the
//! metric value, bounds and tick positions are already resolved. This keeps
//! rendering code focused on drawing and makes the prep easy to test.

use chrono::{DateTime, NaiveTime, Utc};

use crate::domain::{ChartConfig, ParsedPoint};

/// Upper bound on generated ticks; longer spans widen the spacing instead.
const MAX_TICKS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSeries {
    /// `(epoch seconds, value)` in input order.
    pub points: Vec<(f64, f64)>,
    /// Display timestamp of each point (same order as `points`).
    pub labels: Vec<String>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Tick positions (epoch seconds), one per tick interval.
    pub ticks: Vec<f64>,
}

impl TimelineSeries {
    pub fn prepare(points: &[ParsedPoint], config: &ChartConfig) -> Self {
        let step = config.tick_interval.duration().num_seconds().max(1) as f64;

        let xy: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (p.timestamp.timestamp() as f64, p.value))
            .collect();
        let labels = points.iter().map(|p| p.display.clone()).collect();

        let x_bounds = match (points.iter().map(|p| p.timestamp).min(), points.iter().map(|p| p.timestamp).max()) {
            (Some(first), Some(last)) => {
                // Ticks start at the UTC midnight on or before the first point.
                let start = first
                    .date_naive()
                    .and_time(NaiveTime::MIN)
                    .and_utc()
                    .timestamp() as f64;
                let end = (last.timestamp() as f64).max(start + step);
                [start, end]
            }
            _ => [0.0, step],
        };

        let y_min = config.y_min;
        let y_max = xy.iter().map(|&(_, y)| y).fold(f64::NEG_INFINITY, f64::max);
        let y_bounds = if y_max.is_finite() && y_max > y_min {
            let pad = ((y_max - y_min) * 0.05).max(1e-9);
            [y_min, y_max + pad]
        } else {
            [y_min, y_min + 1.0]
        };

        let ticks = if points.is_empty() {
            Vec::new()
        } else {
            // Over long spans, skip whole intervals so the ticks still cover the axis.
            let needed = ((x_bounds[1] - x_bounds[0]) / step).floor() as usize + 1;
            let stride = needed.div_ceil(MAX_TICKS).max(1);
            if stride > 1 {
                tracing::debug!(needed, stride, "too many ticks for the span; widening tick spacing");
            }
            let tick_step = step * stride as f64;

            let mut ticks = Vec::new();
            let mut t = x_bounds[0];
            while t <= x_bounds[1] && ticks.len() < MAX_TICKS {
                ticks.push(t);
                t += tick_step;
            }
            ticks
        };

        Self {
            points: xy,
            labels,
            x_bounds,
            y_bounds,
            ticks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Tick label for an x position (`Jul 1, 08`).
pub fn format_tick(secs: f64) -> String {
    match DateTime::<Utc>::from_timestamp(secs.round() as i64, 0) {
        Some(ts) => ts.format("%b %-d, %y").to_string(),
        None => "-".to_string(),
    }
}

/// Y tick label; counts print without decimals.
pub fn format_value(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
