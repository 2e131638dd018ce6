// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::detail::DetailReport;
use crate::error::{ConsoleError, Result};
use crate::model::{LogEntry, PlayerAction, PlayerSnapshot, ServerSnapshot, TabKind};
use crate::poller::{DEFAULT_REFRESH_TICKS, PollReport};
use crate::roster::RosterTracker;

pub const MAX_COMMAND_INPUT_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleKey {
    Tab,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Interrupt,
    ClearLog,
    ClearInput,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Started,
    Tick,
    Key(ConsoleKey),
    /// The renderer lays out from the frame it is handed, so a resize only
    /// wakes the loop for a redraw and leaves the state alone.
    Resize { width: u16, height: u16 },
    PollFinished(Result<PollReport>),
    DetailFinished {
        player: String,
        result: Result<DetailReport>,
    },
    CommandFinished {
        command: String,
        result: Result<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Poll,
    FetchDetail { player: String },
    Send { command: String },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPhase {
    Loading,
    Shown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupState {
    pub phase: PopupPhase,
    pub snapshot: PlayerSnapshot,
    pub active_action: usize,
    pub actions: Vec<PlayerAction>,
}

impl PopupState {
    pub fn loading(player: &str) -> Self {
        Self {
            phase: PopupPhase::Loading,
            snapshot: PlayerSnapshot::named(player),
            active_action: 0,
            actions: PlayerAction::ALL.to_vec(),
        }
    }

    pub fn is_shown(&self) -> bool {
        self.phase == PopupPhase::Shown
    }

    pub fn player(&self) -> &str {
        &self.snapshot.name
    }

    pub fn selected_action(&self) -> Option<PlayerAction> {
        self.actions.get(self.active_action).copied()
    }

    fn rotate_action(&mut self, delta: isize) {
        if self.actions.is_empty() {
            return;
        }
        let len = self.actions.len() as isize;
        self.active_action = (self.active_action as isize + delta).rem_euclid(len) as usize;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleState {
    pub snapshot: ServerSnapshot,
    pub roster: RosterTracker,
    pub active_tab: TabKind,
    pub input_focused: bool,
    pub selected_player: usize,
    pub popup: Option<PopupState>,
    pub command_input: String,
    pub log: Vec<LogEntry>,
    pub refresh_ticks: u32,
    pub ticks_until_refresh: u32,
    pub last_error: Option<ConsoleError>,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::with_refresh_ticks(DEFAULT_REFRESH_TICKS)
    }
}

impl ConsoleState {
    pub fn with_refresh_ticks(refresh_ticks: u32) -> Self {
        let refresh_ticks = refresh_ticks.max(1);
        Self {
            snapshot: ServerSnapshot::default(),
            roster: RosterTracker::default(),
            active_tab: TabKind::Players,
            input_focused: false,
            selected_player: 0,
            popup: None,
            command_input: String::new(),
            log: Vec::new(),
            refresh_ticks,
            ticks_until_refresh: refresh_ticks,
            last_error: None,
        }
    }

    pub fn selected_player_name(&self) -> Option<&str> {
        self.snapshot
            .players
            .get(self.selected_player)
            .map(String::as_str)
    }

    pub fn dispatch(&mut self, event: ConsoleEvent) -> Vec<Effect> {
        self.dispatch_at(event, now())
    }

    /// Applies one event. Every (state, event) pair is handled; unmatched
    /// keys are no-ops. `now` stamps any log entries the event produces.
    pub fn dispatch_at(&mut self, event: ConsoleEvent, now: OffsetDateTime) -> Vec<Effect> {
        match event {
            ConsoleEvent::Started => vec![Effect::Poll],
            ConsoleEvent::Tick => self.on_tick(),
            ConsoleEvent::Key(key) => self.on_key(key, now),
            ConsoleEvent::Resize { .. } => Vec::new(),
            ConsoleEvent::PollFinished(result) => {
                self.on_poll_finished(result, now);
                Vec::new()
            }
            ConsoleEvent::DetailFinished { player, result } => {
                self.on_detail_finished(&player, result, now);
                Vec::new()
            }
            ConsoleEvent::CommandFinished { command: _, result } => {
                match result {
                    Ok(reply) => self.append_log(now, &reply),
                    Err(error) => {
                        self.append_log(now, &error.to_string());
                        self.last_error = Some(error);
                    }
                }
                Vec::new()
            }
        }
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(popup) = &self.popup {
            effects.push(Effect::FetchDetail {
                player: popup.player().to_owned(),
            });
        }

        self.ticks_until_refresh = self.ticks_until_refresh.saturating_sub(1);
        if self.ticks_until_refresh == 0 {
            self.ticks_until_refresh = self.refresh_ticks;
            effects.push(Effect::Poll);
        }
        effects
    }

    fn on_key(&mut self, key: ConsoleKey, now: OffsetDateTime) -> Vec<Effect> {
        match key {
            ConsoleKey::Esc | ConsoleKey::Interrupt => {
                if self.popup.take().is_some() {
                    return Vec::new();
                }
                return vec![Effect::Quit];
            }
            ConsoleKey::ClearLog => {
                self.log.clear();
                return Vec::new();
            }
            _ => {}
        }

        if self.popup.is_some() {
            return self.on_popup_key(key, now);
        }

        match key {
            ConsoleKey::Tab => {
                self.rotate_tab(1);
                Vec::new()
            }
            _ => match self.active_tab {
                TabKind::Players => self.on_players_key(key),
                TabKind::Commands => self.on_commands_key(key, now),
            },
        }
    }

    fn on_popup_key(&mut self, key: ConsoleKey, now: OffsetDateTime) -> Vec<Effect> {
        let Some(popup) = self.popup.as_mut() else {
            return Vec::new();
        };
        match key {
            ConsoleKey::Left | ConsoleKey::Char('h') => {
                popup.rotate_action(-1);
                Vec::new()
            }
            ConsoleKey::Right | ConsoleKey::Char('l') => {
                popup.rotate_action(1);
                Vec::new()
            }
            ConsoleKey::Enter => {
                let Some(action) = popup.selected_action() else {
                    return Vec::new();
                };
                match action.command_for(popup.player()) {
                    Ok(command) => {
                        self.popup = None;
                        self.append_log(now, &format!("> {command}"));
                        vec![Effect::Send { command }]
                    }
                    Err(error) => {
                        self.last_error = Some(error);
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        }
    }

    fn on_players_key(&mut self, key: ConsoleKey) -> Vec<Effect> {
        match key {
            ConsoleKey::Up | ConsoleKey::Char('k') => {
                self.move_selection(-1);
                Vec::new()
            }
            ConsoleKey::Down | ConsoleKey::Char('j') => {
                self.move_selection(1);
                Vec::new()
            }
            ConsoleKey::Enter => {
                let Some(player) = self.selected_player_name().map(str::to_owned) else {
                    return Vec::new();
                };
                self.popup = Some(PopupState::loading(&player));
                vec![Effect::FetchDetail { player }]
            }
            _ => Vec::new(),
        }
    }

    fn on_commands_key(&mut self, key: ConsoleKey, now: OffsetDateTime) -> Vec<Effect> {
        match key {
            ConsoleKey::Char(ch) => {
                if !ch.is_control() && self.command_input.chars().count() < MAX_COMMAND_INPUT_CHARS
                {
                    self.command_input.push(ch);
                }
                Vec::new()
            }
            ConsoleKey::Backspace => {
                self.command_input.pop();
                Vec::new()
            }
            ConsoleKey::ClearInput => {
                self.command_input.clear();
                Vec::new()
            }
            ConsoleKey::Enter => {
                if self.command_input.is_empty() {
                    return Vec::new();
                }
                let command = std::mem::take(&mut self.command_input);
                self.append_log(now, &format!("> {command}"));
                vec![Effect::Send { command }]
            }
            _ => Vec::new(),
        }
    }

    fn on_poll_finished(&mut self, result: Result<PollReport>, now: OffsetDateTime) {
        let report = match result {
            Ok(report) => report,
            Err(error) => {
                self.last_error = Some(error);
                return;
            }
        };

        for line in report.changes.log_lines() {
            self.append_log(now, &line);
        }
        self.roster.commit(report.snapshot.players.clone());
        self.snapshot = report.snapshot;
        self.clamp_selection();
        self.last_error = None;
    }

    fn on_detail_finished(
        &mut self,
        player: &str,
        result: Result<DetailReport>,
        now: OffsetDateTime,
    ) {
        let Some(popup) = self.popup.as_mut() else {
            return;
        };
        if popup.player() != player {
            return;
        }

        match result {
            Ok(DetailReport::Online(snapshot)) => {
                popup.snapshot = snapshot;
                popup.phase = PopupPhase::Shown;
            }
            Ok(DetailReport::Offline { player }) => {
                self.popup = None;
                self.append_log(now, &format!("{player} is no longer online"));
            }
            Err(error) => {
                self.last_error = Some(error);
            }
        }
    }

    fn rotate_tab(&mut self, delta: isize) {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        self.input_focused = self.active_tab == TabKind::Commands;
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.snapshot.players.len() as isize;
        if len == 0 {
            return;
        }
        self.selected_player = (self.selected_player as isize + delta).rem_euclid(len) as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.snapshot.players.len();
        if self.selected_player >= len {
            self.selected_player = len.saturating_sub(1);
        }
    }

    fn append_log(&mut self, now: OffsetDateTime, text: &str) {
        self.log.push(LogEntry::new(now, text));
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
