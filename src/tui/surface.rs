//! The TUI as a chart surface.
//!
//! Charts live only in the frame buffer, which is redrawn from the attached
//! instance every tick, so teardown has nothing to release beyond the instance.

use crate::chart::{Surface, TimelineSeries};
use crate::domain::{ChartConfig, ParsedPoint};
use crate::error::AppError;

#[derive(Debug, Default)]
pub struct TuiSurface {
    created: u64,
}

/// A chart attached to the TUI, with its point inspector.
#[derive(Debug, Clone)]
pub struct TuiChart {
    pub id: u64,
    pub series: TimelineSeries,
    /// Index of the inspected point; `None` when highlighting is off or the series is empty.
    pub cursor: Option<usize>,
}

impl TuiChart {
    /// Move the inspector by `delta` points, clamped to the series.
    pub fn move_cursor(&mut self, delta: isize) {
        let Some(cursor) = self.cursor else {
            return;
        };
        let last = self.series.points.len().saturating_sub(1);
        self.cursor = Some(cursor.saturating_add_signed(delta).min(last));
    }

    pub fn jump_to(&mut self, end: bool) {
        if self.cursor.is_some() {
            self.cursor = Some(if end { self.series.points.len().saturating_sub(1) } else { 0 });
        }
    }

    /// Display timestamp and value of the inspected point.
    pub fn inspected(&self) -> Option<(&str, f64)> {
        let idx = self.cursor?;
        let (_, value) = *self.series.points.get(idx)?;
        let label = self.series.labels.get(idx)?;
        Some((label.as_str(), value))
    }
}

impl Surface for TuiSurface {
    type Instance = TuiChart;

    fn create(&mut self, points: &[ParsedPoint], config: &ChartConfig) -> Result<TuiChart, AppError> {
        let series = TimelineSeries::prepare(points, config);
        // Start on the most recent point.
        let cursor = if config.highlight {
            series.points.len().checked_sub(1)
        } else {
            None
        };
        self.created += 1;

        Ok(TuiChart {
            id: self.created,
            series,
            cursor,
        })
    }

    fn destroy(&mut self, instance: TuiChart) {
        tracing::debug!(chart = instance.id, "chart detached from terminal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimestampEncoding;
    use crate::io::ingest::transform;

    fn chart(highlight: bool) -> TuiChart {
        let points = transform("1214913600,6.5\n1215518400,5.7\n1216123200,9", TimestampEncoding::Epoch).unwrap();
        let config = ChartConfig {
            highlight,
            ..ChartConfig::default()
        };
        TuiSurface::default().create(&points, &config).unwrap()
    }

    #[test]
    fn inspector_starts_on_latest_point_and_clamps() {
        let mut chart = chart(true);
        assert_eq!(chart.inspected(), Some(("Tue, 15 Jul 2008 12:00:00 GMT", 9.0)));

        chart.move_cursor(1);
        assert_eq!(chart.cursor, Some(2));
        chart.move_cursor(-1);
        assert_eq!(chart.inspected(), Some(("Tue, 08 Jul 2008 12:00:00 GMT", 5.7)));
        chart.move_cursor(-5);
        assert_eq!(chart.cursor, Some(0));
        chart.jump_to(true);
        assert_eq!(chart.cursor, Some(2));
    }

    #[test]
    fn no_inspector_without_highlight() {
        let mut chart = chart(false);
        chart.move_cursor(-1);
        assert_eq!(chart.cursor, None);
        assert_eq!(chart.inspected(), None);
    }

    #[test]
    fn empty_series_has_nothing_to_inspect() {
        let chart = TuiSurface::default().create(&[], &ChartConfig::default()).unwrap();
        assert_eq!(chart.cursor, None);
    }
}
