//! Plotters-powered timeline widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`. Tick labels are drawn separately as text cells
//! (see `draw_axis_ticks` in the parent module), which reads better at
//! terminal resolution than Plotters' own label rendering.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::TimelineSeries;

/// A render-only view of a prepared timeline.
pub struct TimelinePlottersChart<'a> {
    pub series: &'a TimelineSeries,
    /// Point under the inspector, drawn with a guide line.
    pub cursor: Option<usize>,
    /// Mark every data point.
    pub highlight: bool,
}

impl<'a> Widget for TimelinePlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.series.x_bounds;
        let [y0, y1] = self.series.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let points = &self.series.points;
        let cursor = self.cursor.and_then(|i| points.get(i).copied());
        let highlight = self.highlight;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 1)
                .set_label_area_size(LabelAreaPosition::Bottom, 1)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(0)
                .axis_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(75, 178, 197);
            chart.draw_series(LineSeries::new(points.iter().copied(), &line_color))?;

            // `Circle` radii are mapped incorrectly by the ratatui backend, so
            // markers are single pixels.
            if highlight {
                chart.draw_series(points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;
            }

            if let Some((x, y)) = cursor {
                chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &RGBColor(90, 90, 90)))?;
                chart.draw_series(std::iter::once(Pixel::new((x, y), YELLOW)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
