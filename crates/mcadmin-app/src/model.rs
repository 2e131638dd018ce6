// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use time::macros::format_description;

use crate::decode;
use crate::error::{ConsoleError, Result};

pub const MAX_PLAYER_NAME_CHARS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemStack {
    pub id: String,
    pub count: i32,
    pub is_empty: bool,
    pub has_extra_data: bool,
}

impl ItemStack {
    pub fn empty() -> Self {
        Self {
            is_empty: true,
            ..Self::default()
        }
    }

    pub fn label(&self) -> String {
        if self.is_empty {
            return "empty hand".to_owned();
        }
        let id = self.id.strip_prefix("minecraft:").unwrap_or(&self.id);
        if self.count > 1 {
            format!("{id} x{}", self.count)
        } else {
            id.to_owned()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub name: String,
    pub position: Vector3,
    pub health: f64,
    pub food_level: i32,
    pub xp_level: i32,
    pub xp_progress: f64,
    pub dimension: String,
    pub held_item: ItemStack,
}

impl PlayerSnapshot {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceRatios {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSnapshot {
    pub players: Vec<String>,
    pub ping_ms: i64,
    pub version_label: String,
    pub slots_label: String,
    pub motd: String,
    pub clock_label: String,
    pub tps: PerformanceRatios,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: OffsetDateTime,
    pub text: String,
}

impl LogEntry {
    pub fn new(timestamp: OffsetDateTime, text: &str) -> Self {
        Self {
            timestamp,
            text: decode::strip_terminal_escapes(&decode::strip_color_codes(text)),
        }
    }

    pub fn display(&self) -> String {
        let clock = self
            .timestamp
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default();
        format!("[{clock}] {}", self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Players,
    Commands,
}

impl TabKind {
    pub const ALL: [Self; 2] = [Self::Players, Self::Commands];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Commands => "cmds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Muted,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Kick,
    Ban,
}

impl PlayerAction {
    pub const ALL: [Self; 2] = [Self::Kick, Self::Ban];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }

    pub const fn accent(self) -> Accent {
        match self {
            Self::Kick => Accent::Muted,
            Self::Ban => Accent::Danger,
        }
    }

    pub fn command_for(self, player: &str) -> Result<String> {
        validate_player_name(player)?;
        Ok(format!("{} {player}", self.label()))
    }
}

/// Accepts Java names (`[A-Za-z0-9_]`, up to 16 chars) plus the single
/// leading `.` or `*` that Bedrock bridges prepend.
pub fn validate_player_name(name: &str) -> Result<()> {
    let body = name
        .strip_prefix('.')
        .or_else(|| name.strip_prefix('*'))
        .unwrap_or(name);
    let valid = !body.is_empty()
        && body.chars().count() <= MAX_PLAYER_NAME_CHARS
        && body
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(ConsoleError::InvalidPlayerName {
            name: name.to_owned(),
        })
    }
}
