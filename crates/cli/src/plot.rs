use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::style::ResetColor;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::tty::IsTty;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType};
use ratatui::{Frame, Terminal};
use std::fmt;
use std::io::{self, Write as _};
use tracksym_core::{TrackId, TrackSet};

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Red,
    Color::Blue,
];

type PlotTerminal = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Debug)]
pub(super) enum PlotError {
    NotATerminal,
    Init(String),
    Runtime(String),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotATerminal => write!(f, "plotting needs an interactive terminal"),
            Self::Init(message) | Self::Runtime(message) => write!(f, "{}", message),
        }
    }
}

pub(super) fn stdio_is_tty() -> bool {
    io::stdin().is_tty() && io::stdout().is_tty()
}

struct Series {
    id: TrackId,
    points: Vec<(f64, f64)>,
}

pub(super) struct PlotView {
    series: Vec<Series>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl PlotView {
    pub(super) fn from_tracks(tracks: &TrackSet) -> Self {
        let series: Vec<Series> = tracks
            .iter()
            .map(|t| Series {
                id: t.id(),
                points: t.points().iter().map(|p| (p[0], p[1])).collect(),
            })
            .collect();
        let x_bounds = bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
        let y_bounds = bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
        Self {
            series,
            x_bounds,
            y_bounds,
        }
    }

    fn title(&self) -> String {
        let ids: Vec<String> = self.series.iter().map(|s| s.id.to_string()).collect();
        format!(" tracks {} (any key closes) ", ids.join(", "))
    }

    pub(super) fn render(&self, frame: &mut Frame<'_>) {
        let datasets: Vec<Dataset<'_>> = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Dataset::default()
                    .name(format!("track {}", s.id))
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                    .data(&s.points)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(self.title()))
            .x_axis(
                Axis::default()
                    .title("x")
                    .bounds(self.x_bounds)
                    .labels(axis_labels(self.x_bounds)),
            )
            .y_axis(
                Axis::default()
                    .title("y")
                    .bounds(self.y_bounds)
                    .labels(axis_labels(self.y_bounds)),
            );
        frame.render_widget(chart, frame.area());
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        [0.0, 1.0]
    } else if lo == hi {
        [lo - 1.0, hi + 1.0]
    } else {
        [lo, hi]
    }
}

fn axis_labels([lo, hi]: [f64; 2]) -> Vec<String> {
    let mid = (lo + hi) / 2.0;
    [lo, mid, hi].iter().map(|v| format!("{:.1}", v)).collect()
}

struct TerminalGuard {
    terminal: PlotTerminal,
    restored: bool,
}

fn enter_terminal_surface() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    stdout.flush()
}

fn teardown_terminal_surface() -> io::Result<()> {
    let mut stdout = io::stdout();
    let result = execute!(stdout, Show, ResetColor, LeaveAlternateScreen);
    result.and(stdout.flush())
}

impl TerminalGuard {
    fn enter() -> Result<Self, PlotError> {
        enable_raw_mode()
            .map_err(|err| PlotError::Init(format!("failed to enable raw mode: {}", err)))?;

        let backend = CrosstermBackend::new(io::stdout());
        let terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                return Err(PlotError::Init(format!(
                    "failed to initialize terminal: {}",
                    err
                )));
            }
        };

        if let Err(err) = enter_terminal_surface() {
            let _ = teardown_terminal_surface();
            let _ = disable_raw_mode();
            return Err(PlotError::Init(format!(
                "failed to enter alternate screen: {}",
                err
            )));
        }

        Ok(Self {
            terminal,
            restored: false,
        })
    }

    fn terminal_mut(&mut self) -> &mut PlotTerminal {
        &mut self.terminal
    }

    fn restore(&mut self) -> Result<(), PlotError> {
        if self.restored {
            return Ok(());
        }

        let mut failures = Vec::new();
        if let Err(err) = teardown_terminal_surface() {
            failures.push(format!("failed to leave alternate screen: {}", err));
        }
        if let Err(err) = disable_raw_mode() {
            failures.push(format!("failed to disable raw mode: {}", err));
        }
        self.restored = true;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PlotError::Runtime(failures.join("; ")))
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

pub(super) fn show(tracks: &TrackSet) -> Result<(), PlotError> {
    if !stdio_is_tty() {
        return Err(PlotError::NotATerminal);
    }
    let view = PlotView::from_tracks(tracks);
    let mut session = TerminalGuard::enter()?;
    let app_result = run_view(session.terminal_mut(), &view);
    let restore_result = session.restore();
    app_result.and(restore_result)
}

fn run_view(terminal: &mut PlotTerminal, view: &PlotView) -> Result<(), PlotError> {
    let mut dirty = true;
    loop {
        if dirty {
            terminal
                .draw(|frame| view.render(frame))
                .map_err(|err| PlotError::Runtime(format!("failed to draw chart: {}", err)))?;
            dirty = false;
        }

        let event = event::read()
            .map_err(|err| PlotError::Runtime(format!("failed to read event: {}", err)))?;
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(()),
            Event::Resize(_, _) => dirty = true,
            _ => {}
        }
    }
}
