//! Ratatui-based terminal UI.
//!
//! A metric list on the left drives the chart on the right. Selecting a metric
//! starts a background load; completed loads are bound as they arrive, so
//! the screen always shows the last load to finish. The default metric is
//! loaded once at startup.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::chart::{ChartBinder, TimelineSeries, format_tick, format_value};
use crate::cli::TuiArgs;
use crate::cli::picker::metric_options;
use crate::controller::{Delivery, Outcome, SelectionController};
use crate::domain::{ChartConfig, TimestampEncoding, resource_name};
use crate::error::AppError;
use crate::load::{Loader, ResourceSource, Source};

mod plotters_chart;
mod surface;

use plotters_chart::TimelinePlottersChart;
pub use surface::{TuiChart, TuiSurface};

/// Approximate pixel width of one terminal cell.
const CELL_PX: u16 = 8;

/// Start the TUI. Must be called inside a Tokio runtime context.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let source = Source::parse(&args.source.source, Duration::from_secs(args.source.timeout))?;
    let options = metric_options(&args.source, &source);
    let config = crate::app::chart_config(&args.source);
    let mut app = App::new(source, options, config, args.source.encoding);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.start();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App<S: ResourceSource + 'static> {
    controller: SelectionController<S, TuiSurface>,
    options: Vec<String>,
    selected: usize,
    /// Label of the chart on screen.
    charted: Option<String>,
    in_flight: usize,
    status: String,
    tx: UnboundedSender<Delivery>,
    rx: UnboundedReceiver<Delivery>,
}

impl<S: ResourceSource + 'static> App<S> {
    fn new(source: S, options: Vec<String>, config: ChartConfig, encoding: TimestampEncoding) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller: SelectionController::new(
                Loader::new(source),
                ChartBinder::new(TuiSurface::default(), config),
                encoding,
            ),
            options,
            selected: 0,
            charted: None,
            in_flight: 0,
            status: "Starting...".to_string(),
            tx,
            rx,
        }
    }

    /// Load the default selection; only the first call does anything.
    fn start(&mut self) {
        if self.controller.mark_started() {
            self.request_selected();
        }
    }

    fn request_selected(&mut self) {
        let Some(label) = self.options.get(self.selected).cloned() else {
            self.status = "No metrics to show.".to_string();
            return;
        };
        let _ = self.controller.spawn_select(&label, self.tx.clone());
        self.in_flight += 1;
        self.status = format!("Loading {}...", resource_name(&label));
    }

    /// Bind every load that completed since the last call.
    fn drain_deliveries(&mut self) -> bool {
        let mut changed = false;
        while let Ok(delivery) = self.rx.try_recv() {
            self.apply_delivery(delivery);
            changed = true;
        }
        changed
    }

    fn apply_delivery(&mut self, delivery: Delivery) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let label = delivery.label.clone();

        self.status = match self.controller.deliver(delivery) {
            Ok(Outcome::Bound { resource, points, .. }) => {
                self.charted = Some(label.clone());
                format!("{label}: {points} points from {resource}")
            }
            Ok(Outcome::NotDelivered { resource }) => {
                format!("{resource} unavailable; chart unchanged")
            }
            Err(err) => format!("{err}; chart unchanged"),
        };
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_deliveries() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the UI should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.change_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.change_selection(1),
            KeyCode::Char('r') => self.request_selected(),
            KeyCode::Left => self.with_chart(|chart| chart.move_cursor(-1)),
            KeyCode::Right => self.with_chart(|chart| chart.move_cursor(1)),
            KeyCode::Home => self.with_chart(|chart| chart.jump_to(false)),
            KeyCode::End => self.with_chart(|chart| chart.jump_to(true)),
            _ => {}
        }
        false
    }

    fn change_selection(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() - 1;
        let next = self.selected.saturating_add_signed(delta).min(last);
        if next != self.selected {
            self.selected = next;
            self.request_selected();
        }
    }

    fn with_chart(&mut self, f: impl FnOnce(&mut TuiChart)) {
        if let Some(chart) = self.controller.binder_mut().current_mut() {
            f(chart);
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let loading = if self.in_flight > 0 {
            format!(" | loading: {}", self.in_flight)
        } else {
            String::new()
        };
        let line = Line::from(vec![
            Span::styled("vibe", Style::default().fg(Color::Cyan)),
            Span::styled(
                format!(
                    " | source: {} | ticks: every {}{loading}",
                    self.controller.loader().source().describe(),
                    self.controller.binder().config().tick_interval,
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(20), Constraint::Min(0)])
            .split(area);

        self.draw_metrics(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|label| ListItem::new(label.as_str()))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Metric").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self.charted.as_deref().unwrap_or("Timeline");
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(chart) = self.controller.binder().current() else {
            let msg = Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (plot_area, inspector_area) = if inner.height > 1 {
            (
                Rect {
                    height: inner.height - 1,
                    ..inner
                },
                Some(Rect {
                    y: inner.y + inner.height - 1,
                    height: 1,
                    ..inner
                }),
            )
        } else {
            (inner, None)
        };

        let config = self.controller.binder().config();
        let (chart_rect, insets) = chart_layout(plot_area, config.right_padding);
        let widget = TimelinePlottersChart {
            series: &chart.series,
            cursor: chart.cursor,
            highlight: config.highlight,
        };
        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, plot_area, chart_rect, insets, &chart.series);
        }

        if let Some(rect) = inspector_area {
            let text = match chart.inspected() {
                Some((when, value)) => format!("▸ {when}  {}", format_value(value)),
                None if chart.series.is_empty() => "(empty series)".to_string(),
                None => String::new(),
            };
            let p = Paragraph::new(text).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            frame.render_widget(p, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ metric  ←/→ inspect  Home/End  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect, right_padding: u32) -> (Rect, Option<AxisInsets>) {
    let padding_cells = u16::try_from(right_padding / u32::from(CELL_PX)).unwrap_or(u16::MAX);
    let insets = AxisInsets {
        left: 7,
        right: padding_cells.max(2),
        top: 1,
        bottom: 1,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

/// Start column and text of each x tick label that fits without overlapping.
fn x_tick_labels(series: &TimelineSeries, left: u16, width: u16) -> Vec<(u16, String)> {
    let [x0, x1] = series.x_bounds;
    let span = x1 - x0;
    let mut out = Vec::new();
    if width == 0 || !(span > 0.0) {
        return out;
    }

    let right = left + width;
    let mut next_free = left;
    for &tick in &series.ticks {
        let u = ((tick - x0) / span).clamp(0.0, 1.0);
        let col = left + ((width - 1) as f64 * u).round() as u16;
        let label = format_tick(tick);
        let len = label.chars().count() as u16;

        let start = col.saturating_sub(len / 2).max(left).min(right.saturating_sub(len));
        if start < next_free || start + len > right {
            continue;
        }
        next_free = start + len + 1;
        out.push((start, label));
    }
    out
}

fn draw_axis_ticks(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: Rect, insets: AxisInsets, series: &TimelineSeries) {
    let style = Style::default().fg(Color::Gray);

    let y = chart.y + chart.height;
    if y < inner.y + inner.height {
        // Labels may run into the right inset.
        for (x, label) in x_tick_labels(series, chart.x, chart.width + insets.right) {
            let width = label.chars().count() as u16;
            frame.render_widget(Paragraph::new(label).style(style), Rect { x, y, width, height: 1 });
        }
    }

    let ticks = 5usize;
    let [y0, y1] = series.y_bounds;
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let value = y0 + u * (y1 - y0);
        let row = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format_value(value);
        let label_len = label.chars().count() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y: row,
                width: label_len,
                height: 1,
            },
        );
    }
}
