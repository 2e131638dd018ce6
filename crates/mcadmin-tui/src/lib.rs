// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use mcadmin_app::{
    Accent, CommandChannel, ConsoleEvent, ConsoleKey, ConsoleState, Engine, Flow, PlayerSnapshot,
    PopupState, StatusProbe, TabKind,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use std::io;
use std::time::{Duration, Instant};
use tracing::debug;

pub const MIN_WIDTH: u16 = 75;
pub const MIN_HEIGHT: u16 = 21;
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
const BAR_WIDTH: usize = 20;
const INFO_HEIGHT: u16 = 9;
const LEFT_COLUMN_WIDTH: u16 = 34;

/// Drives the console core: applies an event and runs whatever it asks for.
pub trait ConsoleRuntime {
    fn handle(&mut self, state: &mut ConsoleState, event: ConsoleEvent) -> Flow;
}

impl<C, P> ConsoleRuntime for Engine<C, P>
where
    C: CommandChannel,
    P: StatusProbe,
{
    fn handle(&mut self, state: &mut ConsoleState, event: ConsoleEvent) -> Flow {
        Engine::handle(self, state, event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub tick: Duration,
    pub server_label: String,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            server_label: String::new(),
        }
    }
}

pub fn run_app<R: ConsoleRuntime>(
    state: &mut ConsoleState,
    runtime: &mut R,
    options: &UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = event_loop(&mut terminal, state, runtime, options);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: ConsoleRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut ConsoleState,
    runtime: &mut R,
    options: &UiOptions,
) -> Result<()> {
    let size = terminal.size().context("read terminal size")?;
    runtime.handle(
        state,
        ConsoleEvent::Resize {
            width: size.width,
            height: size.height,
        },
    );
    if runtime.handle(state, ConsoleEvent::Started) == Flow::Quit {
        return Ok(());
    }

    let mut next_tick = Instant::now() + options.tick;
    loop {
        terminal
            .draw(|frame| render(frame, state, options))
            .context("draw frame")?;

        let wait = next_tick.saturating_duration_since(Instant::now());
        let event = if event::poll(wait).context("poll event")? {
            match event::read().context("read event")? {
                Event::Key(key) => map_key(key).map(ConsoleEvent::Key),
                Event::Resize(width, height) => Some(ConsoleEvent::Resize { width, height }),
                _ => None,
            }
        } else {
            next_tick = Instant::now() + options.tick;
            Some(ConsoleEvent::Tick)
        };

        let Some(event) = event else {
            continue;
        };
        if runtime.handle(state, event) == Flow::Quit {
            debug!("quit requested");
            return Ok(());
        }
    }
}

pub fn map_key(key: KeyEvent) -> Option<ConsoleKey> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(ConsoleKey::Interrupt),
            KeyCode::Char('l') => Some(ConsoleKey::ClearLog),
            KeyCode::Char('u') => Some(ConsoleKey::ClearInput),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Tab => Some(ConsoleKey::Tab),
        KeyCode::Up => Some(ConsoleKey::Up),
        KeyCode::Down => Some(ConsoleKey::Down),
        KeyCode::Left => Some(ConsoleKey::Left),
        KeyCode::Right => Some(ConsoleKey::Right),
        KeyCode::Enter => Some(ConsoleKey::Enter),
        KeyCode::Esc => Some(ConsoleKey::Esc),
        KeyCode::Backspace => Some(ConsoleKey::Backspace),
        KeyCode::Char(ch) => Some(ConsoleKey::Char(ch)),
        _ => None,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &ConsoleState, options: &UiOptions) {
    let area = frame.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let notice = Paragraph::new(too_small_text(area.width, area.height))
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true });
        frame.render_widget(notice, area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(frame, layout[0], state, options);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(LEFT_COLUMN_WIDTH), Constraint::Min(1)])
        .split(layout[1]);
    render_server_column(frame, columns[0], state);
    render_console_column(frame, columns[1], state);

    let (footer, footer_style) = match &state.last_error {
        Some(error) => (
            format!("error ({}): {error}", error.kind().as_str()),
            Style::default().fg(Color::Red),
        ),
        None => (help_text(state).to_owned(), Style::default().fg(Color::Yellow)),
    };
    let footer_widget = Paragraph::new(footer)
        .style(footer_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer_widget, layout[2]);

    if let Some(popup) = &state.popup {
        let area = centered_rect(60, 70, area);
        frame.render_widget(Clear, area);
        let mut lines = popup_lines(popup)
            .into_iter()
            .map(Line::from)
            .collect::<Vec<Line<'_>>>();
        lines.push(Line::default());
        lines.push(action_line(popup));
        let widget = Paragraph::new(lines).block(
            Block::default()
                .title(popup.player().to_owned())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(widget, area);
    }
}

fn render_header(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &ConsoleState,
    options: &UiOptions,
) {
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(20)])
        .split(area);

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(TabKind::ALL.iter().map(|tab| tab.label()))
        .block(
            Block::default()
                .title(header_title(options))
                .borders(Borders::ALL),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, parts[0]);

    let countdown = Paragraph::new(format!("Refresh in: {}", state.ticks_until_refresh))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(countdown, parts[1]);
}

fn render_server_column(frame: &mut ratatui::Frame<'_>, area: Rect, state: &ConsoleState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(INFO_HEIGHT), Constraint::Min(1)])
        .split(area);

    let ping = state.snapshot.ping_ms;
    let mut info = info_lines(state)
        .into_iter()
        .map(Line::from)
        .collect::<Vec<Line<'_>>>();
    info.insert(
        2,
        Line::from(vec![
            Span::raw("ping: "),
            Span::styled(
                format!("{ping} ms"),
                Style::default().fg(latency_color(ping)),
            ),
        ]),
    );
    let info_widget = Paragraph::new(info)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("server").borders(Borders::ALL));
    frame.render_widget(info_widget, rows[0]);

    let items = state
        .snapshot
        .players
        .iter()
        .map(|name| ListItem::new(name.as_str()))
        .collect::<Vec<ListItem<'_>>>();
    let mut list_state = ListState::default();
    if !state.snapshot.players.is_empty() {
        list_state.select(Some(state.selected_player));
    }
    let title = format!("players ({})", state.snapshot.players.len());
    let highlight = if state.active_tab == TabKind::Players {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(highlight)
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, rows[1], &mut list_state);
}

fn render_console_column(frame: &mut ratatui::Frame<'_>, area: Rect, state: &ConsoleState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let visible = rows[0].height.saturating_sub(2) as usize;
    let width = rows[0].width.saturating_sub(2) as usize;
    let log = Paragraph::new(log_tail(state, visible, width).join("\n"))
        .block(Block::default().title("console").borders(Borders::ALL));
    frame.render_widget(log, rows[0]);

    let input_style = if state.input_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let cursor = if state.input_focused { "_" } else { "" };
    let input = Paragraph::new(format!("> {}{cursor}", state.command_input))
        .style(input_style)
        .block(Block::default().title("command").borders(Borders::ALL));
    frame.render_widget(input, rows[1]);
}

fn header_title(options: &UiOptions) -> String {
    let version = env!("CARGO_PKG_VERSION");
    if options.server_label.is_empty() {
        format!("mcadmin v{version}")
    } else {
        format!("mcadmin v{version} | {}", options.server_label)
    }
}

fn too_small_text(width: u16, height: u16) -> String {
    format!("window is too small: {width}x{height}, need at least {MIN_WIDTH}x{MIN_HEIGHT}")
}

fn help_text(state: &ConsoleState) -> &'static str {
    if state.popup.is_some() {
        return "h/l action | enter run | esc close | ctrl+l clear log";
    }
    match state.active_tab {
        TabKind::Players => "j/k select | enter inspect | tab cmds | ctrl+l clear log | esc quit",
        TabKind::Commands => "type command | enter send | ctrl+u clear | tab players | esc quit",
    }
}

/// Server info rows, ping excluded (it is drawn with its own accent).
fn info_lines(state: &ConsoleState) -> Vec<String> {
    let snapshot = &state.snapshot;
    let tps = snapshot.tps;
    vec![
        format!("version: {}", or_dash(&snapshot.version_label)),
        format!("slots: {}", or_dash(&snapshot.slots_label)),
        format!("clock: {}", or_dash(&snapshot.clock_label)),
        format!(
            "tps: {:.1} / {:.1} / {:.1}",
            tps.one_minute, tps.five_minutes, tps.fifteen_minutes
        ),
        format!("motd: {}", or_dash(&snapshot.motd)),
    ]
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn latency_color(ping_ms: i64) -> Color {
    match ping_ms {
        ..=0 => Color::DarkGray,
        1..=80 => Color::Green,
        81..=200 => Color::Yellow,
        _ => Color::Red,
    }
}

/// The newest `rows` screen lines of the log, oldest first. Entries are split
/// on newlines and hard-wrapped at `width` so the last entry always ends on
/// the bottom row.
fn log_tail(state: &ConsoleState, rows: usize, width: usize) -> Vec<String> {
    let mut tail = Vec::with_capacity(rows);
    for entry in state.log.iter().rev() {
        if tail.len() >= rows {
            break;
        }
        let display = entry.display().replace('\t', "    ");
        let wrapped = display
            .split('\n')
            .flat_map(|line| wrap_line(line, width))
            .collect::<Vec<_>>();
        tail.extend(wrapped.into_iter().rev());
    }
    tail.truncate(rows);
    tail.reverse();
    tail
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let chars = line.chars().collect::<Vec<_>>();
    if chars.is_empty() || width == 0 {
        return vec![line.to_owned()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn popup_lines(popup: &PopupState) -> Vec<String> {
    if !popup.is_shown() {
        return vec![format!("loading {}...", popup.player())];
    }
    let PlayerSnapshot {
        position,
        health,
        food_level,
        xp_level,
        xp_progress,
        dimension,
        held_item,
        ..
    } = &popup.snapshot;
    vec![
        format!(
            "position: {:.1}, {:.1}, {:.1}",
            position.x, position.y, position.z
        ),
        format!("health:   {} {health:.1}/20", bar(*health / 20.0, BAR_WIDTH)),
        format!(
            "food:     {} {food_level}/20",
            bar(f64::from(*food_level) / 20.0, BAR_WIDTH)
        ),
        format!(
            "xp:       level {xp_level} {} {:.0}%",
            bar(*xp_progress, BAR_WIDTH / 2),
            xp_progress.clamp(0.0, 1.0) * 100.0
        ),
        format!("world:    {dimension}"),
        format!("holding:  {}", held_item.label()),
    ]
}

fn action_line(popup: &PopupState) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, action) in popup.actions.iter().enumerate() {
        let color = match action.accent() {
            Accent::Muted => Color::Gray,
            Accent::Danger => Color::Red,
        };
        let mut style = Style::default().fg(color);
        if index == popup.active_action {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }
        spans.push(Span::styled(format!(" {} ", action.label()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let filled = (fraction * width as f64).round() as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
