//! Chart binding.
//!
//! A `Surface` is whatever the chart is drawn on (an SVG file, a text block,
//! the TUI). `ChartBinder` owns the one chart instance attached to its surface
//! and replaces it as a single operation: the previous instance is always
//! released before the new one is created, so a surface never carries two
//! charts, and a failed creation leaves nothing attached rather than a stale
//! instance nobody owns.

use crate::domain::{ChartConfig, ParsedPoint};
use crate::error::AppError;

pub mod series;
pub mod svg;

pub use series::{TimelineSeries, format_tick, format_value};
pub use svg::{SvgChart, SvgSurface};

/// A display surface charts can be attached to.
pub trait Surface {
    type Instance;

    /// Build a chart over `points` and attach it to the surface.
    fn create(&mut self, points: &[ParsedPoint], config: &ChartConfig) -> Result<Self::Instance, AppError>;

    /// Detach `instance` and release everything it holds.
    fn destroy(&mut self, instance: Self::Instance);
}

pub struct ChartBinder<S: Surface> {
    surface: S,
    config: ChartConfig,
    current: Option<S::Instance>,
}

impl<S: Surface> ChartBinder<S> {
    pub fn new(surface: S, config: ChartConfig) -> Self {
        Self {
            surface,
            config,
            current: None,
        }
    }

    /// Replace the current chart with one over `points`.
    pub fn bind(&mut self, points: &[ParsedPoint]) -> Result<&S::Instance, AppError> {
        self.release();

        let instance = self.surface.create(points, &self.config)?;
        tracing::info!(points = points.len(), "chart bound");
        Ok(self.current.insert(instance))
    }

    /// Tear down the current chart, if any.
    pub fn release(&mut self) {
        if let Some(previous) = self.current.take() {
            tracing::debug!("releasing previous chart instance");
            self.surface.destroy(previous);
        }
    }

    pub fn current(&self) -> Option<&S::Instance> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut S::Instance> {
        self.current.as_mut()
    }

    /// Take the attached chart out; it stays on the surface untouched.
    pub fn into_current(self) -> Option<S::Instance> {
        self.current
    }

    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Surface that records create/destroy calls and how many charts are attached.
    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub events: Vec<String>,
        pub attached: usize,
        pub max_attached: usize,
        pub fail_next: bool,
        next_id: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedChart {
        pub id: u32,
        pub values: Vec<f64>,
    }

    impl Surface for RecordingSurface {
        type Instance = RecordedChart;

        fn create(&mut self, points: &[ParsedPoint], _config: &ChartConfig) -> Result<RecordedChart, AppError> {
            if std::mem::take(&mut self.fail_next) {
                self.events.push("create failed".to_string());
                return Err(AppError::new(4, "surface unavailable"));
            }
            self.next_id += 1;
            self.attached += 1;
            self.max_attached = self.max_attached.max(self.attached);
            self.events.push(format!("create {}", self.next_id));
            Ok(RecordedChart {
                id: self.next_id,
                values: points.iter().map(|p| p.value).collect(),
            })
        }

        fn destroy(&mut self, instance: RecordedChart) {
            self.attached -= 1;
            self.events.push(format!("destroy {}", instance.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSurface;
    use super::*;
    use crate::domain::TimestampEncoding;
    use crate::io::ingest::transform;

    fn sample() -> Vec<ParsedPoint> {
        transform("1214913600,6.5\n1215518400,5.7", TimestampEncoding::Epoch).unwrap()
    }

    #[test]
    fn rebinding_tears_down_before_create() {
        let mut binder = ChartBinder::new(RecordingSurface::default(), ChartConfig::default());
        let points = sample();

        binder.bind(&points).unwrap();
        binder.bind(&points).unwrap();

        let surface = binder.surface();
        assert_eq!(surface.events, vec!["create 1", "destroy 1", "create 2"]);
        assert_eq!(surface.attached, 1);
        assert_eq!(surface.max_attached, 1);
        assert_eq!(binder.current().unwrap().id, 2);
    }

    #[test]
    fn failed_create_leaves_nothing_attached() {
        let mut binder = ChartBinder::new(RecordingSurface::default(), ChartConfig::default());
        binder.bind(&sample()).unwrap();

        binder.surface.fail_next = true;
        assert!(binder.bind(&sample()).is_err());

        assert!(!binder.is_bound());
        assert_eq!(binder.surface().attached, 0);
        assert_eq!(binder.surface().events, vec!["create 1", "destroy 1", "create failed"]);
    }

    #[test]
    fn release_without_chart_is_a_no_op() {
        let mut binder = ChartBinder::new(RecordingSurface::default(), ChartConfig::default());
        binder.release();
        assert!(binder.surface().events.is_empty());

        binder.bind(&sample()).unwrap();
        binder.release();
        assert_eq!(binder.surface().events, vec!["create 1", "destroy 1"]);
        assert!(binder.current().is_none());
    }
}
