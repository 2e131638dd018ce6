// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Decoders for the text replies a server sends back over RCON.
//!
//! Every decoder belongs to one of two classes. Tolerant decoders feed the
//! always-visible dashboard and fall back to an empty or default value when a
//! reply does not look like what they expect. Strict decoders feed the player
//! popup and reject anything that does not match, so the caller can keep the
//! last good snapshot instead of showing zeroes.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ConsoleError, Result};
use crate::model::{ItemStack, PerformanceRatios, Vector3};

pub const CLOCK_FALLBACK: &str = "00:00 AM";
pub const TICKS_PER_DAY: u64 = 24_000;
const TICKS_PER_HOUR: u64 = 1_000;
const DAWN_HOUR: u64 = 6;

const EMPTY_HAND_SENTINEL: &str = "Found no elements matching SelectedItem";
const EMPTY_COMPOUND: &str = "{}";

static COLOR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"§.").expect("valid regex"));
static ANSI_CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("valid regex"));
static CLOCK_TICKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"The time is (\d+)").expect("valid regex"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));
static SLOTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"There are (\d+) of a max(?: of)? (\d+) players online").expect("valid regex")
});
static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"running\s+(\w+)\s+version\s+(\d+(?:\.\d+)*)").expect("valid regex")
});
static POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^,\]]+?)d, ([^,\]]+?)d, ([^,\]]+?)d\]").expect("valid regex")
});
static TRAILING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s:])(-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)[fdFD]?$").expect("valid regex")
});
static TRAILING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s:])(-?\d+)[bsilBSIL]?$").expect("valid regex"));
static DIMENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""minecraft:([^"]+)""#).expect("valid regex"));
static ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid:\s*"([^"]+)""#).expect("valid regex"));
static ITEM_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[cC]ount:\s*(\d+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    Tolerant,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Roster,
    Slots,
    Clock,
    Performance,
    Version,
    Position,
    Health,
    FoodLevel,
    XpLevel,
    XpProgress,
    Dimension,
    HeldItem,
}

impl ReplyKind {
    pub const ALL: [Self; 12] = [
        Self::Roster,
        Self::Slots,
        Self::Clock,
        Self::Performance,
        Self::Version,
        Self::Position,
        Self::Health,
        Self::FoodLevel,
        Self::XpLevel,
        Self::XpProgress,
        Self::Dimension,
        Self::HeldItem,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Roster => "player roster",
            Self::Slots => "slot count",
            Self::Clock => "world time",
            Self::Performance => "tick rate",
            Self::Version => "server version",
            Self::Position => "position",
            Self::Health => "health",
            Self::FoodLevel => "food level",
            Self::XpLevel => "xp level",
            Self::XpProgress => "xp progress",
            Self::Dimension => "dimension",
            Self::HeldItem => "held item",
        }
    }

    pub const fn policy(self) -> DecodePolicy {
        match self {
            Self::Roster | Self::Slots | Self::Clock | Self::Performance | Self::Version => {
                DecodePolicy::Tolerant
            }
            Self::Position
            | Self::Health
            | Self::FoodLevel
            | Self::XpLevel
            | Self::XpProgress
            | Self::Dimension
            | Self::HeldItem => DecodePolicy::Strict,
        }
    }
}

pub fn strip_color_codes(text: &str) -> String {
    COLOR_CODE.replace_all(text, "").into_owned()
}

/// Removes ANSI CSI sequences, then every control character except newline
/// and tab, so reply text can be drawn into terminal cells as-is.
pub fn strip_terminal_escapes(text: &str) -> String {
    ANSI_CSI
        .replace_all(text, "")
        .chars()
        .filter(|ch| *ch == '\n' || *ch == '\t' || !ch.is_control())
        .collect()
}

/// Splits `"<prefix>: a, b, c"` into names. A reply without a colon and a
/// reply with nothing after it both decode to an empty roster.
pub fn decode_roster(raw: &str) -> Vec<String> {
    let Some((_, names)) = raw.split_once(':') else {
        return Vec::new();
    };
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn decode_slots(raw: &str) -> String {
    SLOTS
        .captures(raw)
        .map(|caps| format!("{}/{}", &caps[1], &caps[2]))
        .unwrap_or_default()
}

pub fn decode_clock(raw: &str) -> String {
    let Some(ticks) = CLOCK_TICKS
        .captures(raw)
        .and_then(|caps| caps[1].parse::<u64>().ok())
    else {
        return CLOCK_FALLBACK.to_owned();
    };
    clock_label(ticks)
}

pub fn clock_label(ticks: u64) -> String {
    let ticks = ticks % TICKS_PER_DAY;
    let hour = (ticks / TICKS_PER_HOUR + DAWN_HOUR) % 24;
    let minute = (ticks % TICKS_PER_HOUR) * 60 / TICKS_PER_HOUR;
    let period = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour {
        0 => 12,
        13.. => hour - 12,
        _ => hour,
    };
    format!("{hour12:02}:{minute:02} {period}")
}

pub fn decode_performance(raw: &str) -> PerformanceRatios {
    let clean = strip_color_codes(raw);
    let Some((_, averages)) = clean.split_once(':') else {
        return PerformanceRatios::default();
    };
    let values = DECIMAL
        .find_iter(averages)
        .filter_map(|token| token.as_str().parse::<f64>().ok())
        .take(3)
        .collect::<Vec<f64>>();
    match values.as_slice() {
        [one, five, fifteen] => PerformanceRatios {
            one_minute: *one,
            five_minutes: *five,
            fifteen_minutes: *fifteen,
        },
        _ => PerformanceRatios::default(),
    }
}

pub fn decode_version(raw: &str) -> String {
    VERSION
        .captures(raw)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]))
        .unwrap_or_default()
}

pub fn decode_position(raw: &str) -> Result<Vector3> {
    let reject = || ConsoleError::decode(ReplyKind::Position.label(), raw);
    let caps = POSITION.captures(raw).ok_or_else(reject)?;
    let axis = |index: usize| caps[index].trim().parse::<f64>().map_err(|_| reject());
    Ok(Vector3::new(axis(1)?, axis(2)?, axis(3)?))
}

pub fn decode_health(raw: &str) -> Result<f64> {
    decode_trailing_float(raw, ReplyKind::Health)
}

pub fn decode_xp_progress(raw: &str) -> Result<f64> {
    decode_trailing_float(raw, ReplyKind::XpProgress)
}

pub fn decode_food_level(raw: &str) -> Result<i32> {
    decode_trailing_int(raw, ReplyKind::FoodLevel)
}

pub fn decode_xp_level(raw: &str) -> Result<i32> {
    decode_trailing_int(raw, ReplyKind::XpLevel)
}

pub fn decode_dimension(raw: &str) -> Result<String> {
    DIMENSION
        .captures(raw)
        .map(|caps| caps[1].to_owned())
        .ok_or_else(|| ConsoleError::decode(ReplyKind::Dimension.label(), raw))
}

/// Enchantments, custom names and item components are not inspected, so
/// `has_extra_data` stays false. Only the outermost compound is searched for
/// `id` and `count`; nested ones (bundle contents, custom data) are ignored.
pub fn decode_held_item(raw: &str) -> Result<ItemStack> {
    let trimmed = raw.trim();
    if trimmed.contains(EMPTY_HAND_SENTINEL) || trimmed == EMPTY_COMPOUND {
        return Ok(ItemStack::empty());
    }

    let reject = || ConsoleError::decode(ReplyKind::HeldItem.label(), raw);
    let fields = outer_compound_fields(trimmed);
    let id = ITEM_ID.captures(&fields).ok_or_else(reject)?;
    let count = ITEM_COUNT.captures(&fields).ok_or_else(reject)?;
    let count = count[1].parse::<i32>().map_err(|_| reject())?;

    Ok(ItemStack {
        id: id[1].to_owned(),
        count,
        is_empty: false,
        has_extra_data: false,
    })
}

/// Text of the first `{...}` compound with every nested compound and list
/// cut out. Quoted strings are kept whole. Without a `{` the input is
/// returned unchanged.
fn outer_compound_fields(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return text.to_owned();
    };
    let mut fields = String::new();
    let mut depth = 0_usize;
    let mut quote = None;
    let mut escaped = false;
    for ch in text[start..].chars() {
        if let Some(open) = quote {
            if depth == 1 {
                fields.push(ch);
            }
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                if depth == 1 {
                    fields.push(ch);
                }
            }
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
            _ if depth == 1 => fields.push(ch),
            _ => {}
        }
    }
    fields
}

fn decode_trailing_float(raw: &str, kind: ReplyKind) -> Result<f64> {
    TRAILING_FLOAT
        .captures(raw.trim())
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .ok_or_else(|| ConsoleError::decode(kind.label(), raw))
}

fn decode_trailing_int(raw: &str, kind: ReplyKind) -> Result<i32> {
    TRAILING_INT
        .captures(raw.trim())
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .ok_or_else(|| ConsoleError::decode(kind.label(), raw))
}
