//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - the metric line: `-`
//! - highlighted points: `o`
//! - x-axis ticks: `+`

use crate::chart::{Surface, TimelineSeries, format_tick, format_value};
use crate::domain::{ChartConfig, ParsedPoint};
use crate::error::AppError;

/// Approximate pixel width of one terminal cell, used to convert padding.
const CELL_PX: usize = 8;

/// Text surface: the attached chart is a rendered block of text.
#[derive(Debug, Clone)]
pub struct AsciiSurface {
    width: usize,
    height: usize,
}

#[derive(Debug, Clone)]
pub struct AsciiChart {
    pub series: TimelineSeries,
    pub text: String,
}

impl AsciiSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Surface for AsciiSurface {
    type Instance = AsciiChart;

    fn create(&mut self, points: &[ParsedPoint], config: &ChartConfig) -> Result<AsciiChart, AppError> {
        let series = TimelineSeries::prepare(points, config);
        let text = render_ascii_timeline(&series, config, self.width, self.height);
        Ok(AsciiChart { series, text })
    }

    fn destroy(&mut self, _instance: AsciiChart) {}
}

/// Render a timeline into a fixed-size character grid.
pub fn render_ascii_timeline(series: &TimelineSeries, config: &ChartConfig, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let pad = (config.right_padding as usize / CELL_PX).min(width / 2);
    let plot_width = width - pad;

    let [x_min, x_max] = series.x_bounds;
    let [y_min, y_max] = series.y_bounds;

    let mut grid = vec![vec![' '; width]; height];

    // Line first so markers overlay it.
    let mut prev = None;
    for &(x, y) in &series.points {
        let col = map_x(x, x_min, x_max, plot_width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(&mut grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }

    if config.highlight {
        for &(x, y) in &series.points {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, plot_width)] = 'o';
        }
    }

    let mut axis = vec!['-'; plot_width];
    axis.resize(width, ' ');
    for &t in &series.ticks {
        axis[map_x(t, x_min, x_max, plot_width)] = '+';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | y=[{}, {}]\n",
        format_tick(x_min),
        format_tick(x_max),
        format_value(y_min),
        format_value(y_max),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&axis.into_iter().collect::<String>());
    out.push('\n');

    out
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartBinder;
    use crate::domain::TimestampEncoding;
    use crate::io::ingest::transform;

    fn two_points() -> Vec<ParsedPoint> {
        transform("1214913600,6.5\n1215518400,5.7", TimestampEncoding::Epoch).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let config = ChartConfig {
            right_padding: 0,
            ..ChartConfig::default()
        };
        let series = TimelineSeries::prepare(&two_points(), &config);

        let txt = render_ascii_timeline(&series, &config, 10, 5);
        let expected = concat!(
            "Plot: Jul 1, 08 .. Jul 8, 08 | y=[0, 6.8]\n",
            " o---     \n",
            "     ----o\n",
            "          \n",
            "          \n",
            "          \n",
            "+-------+-\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn right_padding_keeps_last_columns_free() {
        let config = ChartConfig::default();
        let series = TimelineSeries::prepare(&two_points(), &config);
        let txt = render_ascii_timeline(&series, &config, 20, 5);

        // 35px of padding is 4 cells.
        for line in txt.lines().skip(1) {
            assert_eq!(line.chars().count(), 20);
            assert!(line.ends_with("    "), "line not padded: {line:?}");
        }
    }

    #[test]
    fn surface_renders_on_bind() {
        let mut binder = ChartBinder::new(AsciiSurface::new(30, 8), ChartConfig::default());
        let chart = binder.bind(&two_points()).unwrap();
        assert_eq!(chart.series.points.len(), 2);
        let markers: usize = chart.text.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(markers, 2);
    }
}
