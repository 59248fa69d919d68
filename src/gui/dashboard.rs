//! The live dashboard: four rolling charts, the head-position indicator, an
//! activity log and a status line, redrawn every tick.

use std::{collections::VecDeque, path::PathBuf, time::Duration};

use crate::config::DashConfig;
use crate::gui::{error::DashGuiError, with_terminal, Term};
use crate::head_position::{HeadIndicator, HeadPosition};
use crate::record::Sample;
use crate::rolling_window::RollingWindow;
use crate::session::Session;
use crate::transport::{Link, LinkEvent, TransportError};
use crate::window_store::{Channel, PresentationSink};

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::{error, info};
use ratatui::{
    prelude::*,
    widgets::{block::Title, *},
};

/// Opens a new link each time the user asks to connect.
pub type Connector = Box<dyn FnMut() -> Result<Link, TransportError>>;

const CHART_COLORS: [Color; 4] = [
    Color::Rgb(239, 68, 68),
    Color::Rgb(249, 115, 22),
    Color::Rgb(59, 130, 246),
    Color::Rgb(168, 85, 247),
];

/// One chart, ready to hand to ratatui.
#[derive(Debug, Clone, Default)]
struct ChartData {
    points: Vec<(f64, f64)>,
    first_label: String,
    last_label: String,
    len: usize,
    y_bounds: [f64; 2],
}

impl ChartData {
    fn from_window(window: &RollingWindow) -> Self {
        // Missing values leave a gap rather than dropping to zero
        let points: Vec<(f64, f64)> = window
            .points()
            .enumerate()
            .filter_map(|(i, p)| p.value.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
            .collect();

        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
                (lo.min(y), hi.max(y))
            });
        let y_bounds = if lo.is_finite() {
            let grace = ((hi - lo) * 0.05).max(0.5);
            [lo - grace, hi + grace]
        } else {
            [0.0, 1.0]
        };

        Self {
            first_label: window.points().next().map(|p| p.label.clone()).unwrap_or_default(),
            last_label: window.latest().map(|p| p.label.clone()).unwrap_or_default(),
            len: window.len(),
            points,
            y_bounds,
        }
    }
}

/// The [`PresentationSink`] behind the terminal dashboard. It keeps a
/// chart-ready copy of everything it is told about, so drawing a frame never
/// has to touch the session.
#[derive(Debug, Clone)]
pub struct DashboardSink {
    charts: [ChartData; 4],
    head_label: String,
    head_angle: f64,
    activity: VecDeque<String>,
    max_activity: usize,
    status: String,
    rows: usize,
}

impl DashboardSink {
    /// Instantiates an empty sink keeping at most `max_activity` log lines.
    pub fn new(max_activity: usize) -> Self {
        let neutral = HeadIndicator::neutral();
        Self {
            charts: Default::default(),
            head_label: neutral.label().to_owned(),
            head_angle: neutral.angle_degrees(),
            activity: VecDeque::with_capacity(max_activity),
            max_activity: max_activity.max(1),
            status: String::new(),
            rows: 0,
        }
    }

    fn chart(&self, channel: Channel) -> Option<&ChartData> {
        Channel::NUMERIC
            .iter()
            .position(|&c| c == channel)
            .map(|i| &self.charts[i])
    }

    /// Lines in the activity panel, oldest first.
    pub fn activity_lines(&self) -> impl Iterator<Item = &str> {
        self.activity.iter().map(String::as_str)
    }

    /// Rows in the table since the last clear.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl PresentationSink for DashboardSink {
    fn redraw(&mut self, channel: Channel, window: &RollingWindow) {
        if let Some(i) = Channel::NUMERIC.iter().position(|&c| c == channel) {
            self.charts[i] = ChartData::from_window(window);
        }
    }

    fn head_moved(&mut self, indicator: &HeadIndicator) {
        self.head_label = indicator.label().to_owned();
        self.head_angle = indicator.angle_degrees();
    }

    fn row_appended(&mut self, _sample: &Sample) {
        self.rows += 1;
    }

    fn activity(&mut self, line: &str) {
        if self.activity.len() == self.max_activity {
            self.activity.pop_front();
        }
        self.activity.push_back(line.to_owned());
    }

    fn status(&mut self, status: &str) {
        self.status = status.to_owned();
    }

    fn cleared(&mut self) {
        *self = Self {
            status: std::mem::take(&mut self.status),
            ..Self::new(self.max_activity)
        };
    }
}

struct App {
    session: Session<DashboardSink>,
    link: Option<Link>,
    connector: Connector,
    export_dir: PathBuf,
}

impl App {
    fn new(config: &DashConfig, connector: Connector) -> Self {
        Self {
            session: Session::new(config, DashboardSink::new(config.activity_lines)),
            link: None,
            connector,
            export_dir: config.export_dir.clone(),
        }
    }

    fn connect(&mut self) {
        if self.link.is_some() {
            return;
        }
        match (self.connector)() {
            Ok(link) => {
                info!("Link {} started", link.name());
                self.link = Some(link);
            }
            Err(e) => {
                error!("Could not connect: {}", e);
                self.session.report_error(&e);
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.disconnect();
            // Pick up whatever arrived before the link stopped. A reader still
            // stuck in a read is not waited for.
            if self.session.drain(link.events()) {
                self.session.handle(LinkEvent::Disconnected);
            }
        }
    }

    fn on_tick(&mut self) {
        if let Some(link) = &self.link {
            if !self.session.drain(link.events()) {
                self.link = None;
            }
        }
    }

    fn export(&mut self) {
        // Failures are already on the activity panel
        let _ = self.session.export(&self.export_dir, Utc::now());
    }
}

/// Runs the dashboard until the user quits. `connector` is called once up
/// front and again on every connect request.
pub fn run_dashboard(config: &DashConfig, connector: Connector) -> Result<(), DashGuiError> {
    let mut app = App::new(config, connector);
    app.connect();

    let res = with_terminal(|terminal| run_app(terminal, &mut app, config.tick_rate()));
    app.disconnect();
    res
}

fn run_app(terminal: &mut Term, app: &mut App, tick_rate: Duration) -> Result<(), DashGuiError> {
    loop {
        app.on_tick();
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(tick_rate)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('c') => app.connect(),
                KeyCode::Char('d') => app.disconnect(),
                KeyCode::Char('e') => app.export(),
                KeyCode::Char('x') => app.session.clear(),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let sink = app.session.sink();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_status(f, rows[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[1]);

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body[0]);
    let cells: Vec<Rect> = halves
        .iter()
        .flat_map(|&half| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(half)
                .to_vec()
        })
        .collect();

    for ((channel, color), area) in Channel::NUMERIC.iter().zip(CHART_COLORS).zip(cells) {
        if let Some(data) = sink.chart(*channel) {
            render_chart(f, area, *channel, data, color);
        }
    }

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(body[1]);
    render_head(f, side[0], sink);
    render_activity(f, side[1], sink);

    let legend = Line::from(vec![
        " Connect ".into(),
        "<C>".magenta().bold(),
        " Disconnect ".into(),
        "<D>".magenta().bold(),
        " Export ".into(),
        "<E>".magenta().bold(),
        " Clear ".into(),
        "<X>".magenta().bold(),
        " Quit ".into(),
        "<Q>".magenta().bold(),
    ]);
    f.render_widget(Paragraph::new(legend).alignment(Alignment::Center), rows[2]);
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let color = if app.session.is_connected() {
        Color::Green
    } else {
        Color::Red
    };
    let text = Line::from(vec![
        Span::styled(app.session.status().to_owned(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        format!(
            "   samples: {}   dropped: {}",
            app.session.log().len(),
            app.session.dropped()
        )
        .into(),
    ]);
    let block = Block::default()
        .title(Title::from(" SenseDash ".magenta().bold()).alignment(Alignment::Center))
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_chart(f: &mut Frame, area: Rect, channel: Channel, data: &ChartData, color: Color) {
    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data.points)];

    let x_max = data.len.saturating_sub(1).max(1) as f64;
    let [y_min, y_max] = data.y_bounds;
    let latest = data
        .points
        .last()
        .map_or_else(|| "-".to_owned(), |&(_, y)| format!("{:.2}", y));

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ({}) ", channel.title(), latest))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::from(data.first_label.clone()),
                    Span::from(data.last_label.clone()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(
                    [y_min, (y_min + y_max) / 2.0, y_max]
                        .iter()
                        .map(|v| Span::from(format!("{:.1}", v)))
                        .collect(),
                ),
        );

    f.render_widget(chart, area);
}

fn render_head(f: &mut Frame, area: Rect, sink: &DashboardSink) {
    let left = HeadPosition::ExtremeLeft.angle_degrees();
    let right = HeadPosition::ExtremeRight.angle_degrees();
    let ratio = ((sink.head_angle - left) / (right - left)).clamp(0.0, 1.0);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Head Position ")
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(Color::Rgb(34, 197, 94)))
        .ratio(ratio)
        .label(format!("{} ({:+.1}°)", sink.head_label, sink.head_angle));

    f.render_widget(gauge, area);
}

fn render_activity(f: &mut Frame, area: Rect, sink: &DashboardSink) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = sink.activity.len().saturating_sub(visible);
    let items: Vec<ListItem> = sink
        .activity_lines()
        .skip(skip)
        .map(|line| {
            let style = if line.starts_with("[err]") {
                Style::default().fg(Color::Red)
            } else if line.starts_with('[') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(line.to_owned()).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().title(" Log ").borders(Borders::ALL));
    f.render_widget(list, area);
}
