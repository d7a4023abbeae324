//! SVG file surface rendered with Plotters.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::Surface;
use super::series::{TimelineSeries, format_tick, format_value};
use crate::domain::{ChartConfig, ParsedPoint};
use crate::error::AppError;

/// Writes the chart to an SVG file; the file is the attached chart.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    path: PathBuf,
}

/// A chart currently attached to an `SvgSurface`.
#[derive(Debug, Clone)]
pub struct SvgChart {
    pub path: PathBuf,
    pub series: TimelineSeries,
    pub document: String,
}

impl SvgSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Surface for SvgSurface {
    type Instance = SvgChart;

    fn create(&mut self, points: &[ParsedPoint], config: &ChartConfig) -> Result<SvgChart, AppError> {
        let series = TimelineSeries::prepare(points, config);
        let document = render_svg(&series, config)?;

        fs::write(&self.path, &document)
            .map_err(|e| AppError::new(4, format!("Failed to write chart '{}': {e}", self.path.display())))?;

        Ok(SvgChart {
            path: self.path.clone(),
            series,
            document,
        })
    }

    fn destroy(&mut self, instance: SvgChart) {
        match fs::remove_file(&instance.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %instance.path.display(), error = %e, "failed to remove previous chart"),
        }
    }
}

/// Render a timeline to an SVG document.
pub fn render_svg(series: &TimelineSeries, config: &ChartConfig) -> Result<String, AppError> {
    let draw_err = |e: &dyn std::fmt::Display| AppError::new(4, format!("Failed to draw chart: {e}"));

    let mut document = String::new();
    {
        let root = SVGBackend::with_string(&mut document, (config.width, config.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_err(&e))?;

        let [x0, x1] = series.x_bounds;
        let [y0, y1] = series.y_bounds;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .margin_right(config.right_padding)
            .x_label_area_size(36)
            .y_label_area_size(48)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(|e| draw_err(&e))?;

        // X labels are placed on the series' own ticks below, not on Plotters' key points.
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_label_formatter(&|v| format_value(*v))
            .y_desc(config.y_label.as_str())
            .label_style(("sans-serif", 12).into_font().color(&BLACK))
            .draw()
            .map_err(|e| draw_err(&e))?;

        let tick_style = ("sans-serif", 12)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for &tick in &series.ticks {
            let (px, py) = chart.backend_coord(&(tick, y0));
            root.draw(&PathElement::new(vec![(px, py), (px, py + 5)], &BLACK))
                .map_err(|e| draw_err(&e))?;
            root.draw(&Text::new(format_tick(tick), (px, py + 8), tick_style.clone()))
                .map_err(|e| draw_err(&e))?;
        }

        let line_color = RGBColor(75, 178, 197);
        chart
            .draw_series(LineSeries::new(series.points.iter().copied(), line_color.stroke_width(2)))
            .map_err(|e| draw_err(&e))?;

        // A static document cannot react to hover, so highlighted markers are
        // drawn for every point instead.
        if config.highlight {
            let radius = (config.highlight_size / 2).max(1);
            chart
                .draw_series(
                    series
                        .points
                        .iter()
                        .map(|&p| Circle::new(p, radius, line_color.filled())),
                )
                .map_err(|e| draw_err(&e))?;
        }

        root.present().map_err(|e| draw_err(&e))?;
    }

    Ok(document)
}
