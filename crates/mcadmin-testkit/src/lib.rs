// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use mcadmin_app::error::Result;
use mcadmin_app::{
    CommandChannel, ConsoleError, ItemStack, PlayerField, PlayerSnapshot, ROSTER_COMMAND,
    ServerStatus, StatusProbe, Vector3,
};
use std::collections::{HashMap, VecDeque};

const NAME_PREFIXES: [&str; 12] = [
    "Steve", "Alex", "Creeper", "Diamond", "Ender", "Nether", "Redstone", "Pixel", "Blaze",
    "Slime", "Golem", "Warden",
];

const NAME_SUFFIXES: [&str; 8] = ["", "_", "42", "Miner", "x", "99", "_MC", "Craft"];

const DIMENSIONS: [&str; 3] = ["overworld", "the_nether", "the_end"];

const ITEMS: [&str; 8] = [
    "minecraft:diamond_sword",
    "minecraft:cobblestone",
    "minecraft:torch",
    "minecraft:bread",
    "minecraft:oak_log",
    "minecraft:iron_pickaxe",
    "minecraft:shield",
    "minecraft:ender_pearl",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for player names and snapshots whose values survive a
/// trip through the entity data reply format unchanged.
#[derive(Debug, Clone)]
pub struct ServerFaker {
    rng: DeterministicRng,
}

impl ServerFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn player_name(&mut self) -> String {
        let prefix = self.pick(&NAME_PREFIXES);
        let suffix = self.pick(&NAME_SUFFIXES);
        format!("{prefix}{suffix}")
    }

    /// Distinct names, in generation order.
    pub fn roster(&mut self, count: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(count);
        while names.len() < count {
            let name = self.player_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn player_snapshot(&mut self, name: &str) -> PlayerSnapshot {
        let held_item = if self.rng.bool() {
            ItemStack {
                id: self.pick(&ITEMS).to_owned(),
                count: self.int_range(1, 64),
                is_empty: false,
                has_extra_data: false,
            }
        } else {
            ItemStack::empty()
        };

        PlayerSnapshot {
            name: name.to_owned(),
            position: Vector3::new(
                self.half_step(-2_000, 2_000),
                self.half_step(-64, 320),
                self.half_step(-2_000, 2_000),
            ),
            health: self.half_step(1, 20),
            food_level: self.int_range(0, 20),
            xp_level: self.int_range(0, 60),
            xp_progress: f64::from(self.int_range(0, 3)) / 4.0,
            dimension: self.pick(&DIMENSIONS).to_owned(),
            held_item,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as usize;
        min + self.rng.int_n(span) as i32
    }

    fn half_step(&mut self, min: i32, max: i32) -> f64 {
        f64::from(self.int_range(min * 2, max * 2)) / 2.0
    }
}

pub fn roster_reply(players: &[&str], max: usize) -> String {
    format!(
        "There are {} of a max of {max} players online: {}",
        players.len(),
        players.join(", ")
    )
}

pub fn time_reply(ticks: u64) -> String {
    format!("The time is {ticks}")
}

pub fn tps_reply(one: f64, five: f64, fifteen: f64) -> String {
    format!("§6TPS from last 1m, 5m, 15m: §a{one:.1}, §a{five:.1}, §a{fifteen:.1}")
}

pub fn version_reply(brand: &str, version: &str) -> String {
    format!("This server is running {brand} version {version}-15-abcdef (MC: {version})")
}

pub fn entity_reply(player: &str, value: &str) -> String {
    format!("{player} has the following entity data: {value}")
}

/// Replies to the seven entity data reads, in [`PlayerField::ALL`] order.
pub fn detail_replies(snapshot: &PlayerSnapshot) -> Vec<(String, String)> {
    let name = snapshot.name.as_str();
    PlayerField::ALL
        .iter()
        .map(|field| {
            let value = match field {
                PlayerField::Position => format!(
                    "[{}d, {}d, {}d]",
                    snapshot.position.x, snapshot.position.y, snapshot.position.z
                ),
                PlayerField::Health => format!("{}f", snapshot.health),
                PlayerField::FoodLevel => snapshot.food_level.to_string(),
                PlayerField::XpLevel => snapshot.xp_level.to_string(),
                PlayerField::XpProgress => format!("{}f", snapshot.xp_progress),
                PlayerField::Dimension => format!("\"minecraft:{}\"", snapshot.dimension),
                PlayerField::HeldItem => {
                    if snapshot.held_item.is_empty {
                        return (
                            field.command_for(name),
                            "Found no elements matching SelectedItem".to_owned(),
                        );
                    }
                    format!(
                        "{{count: {}, id: \"{}\"}}",
                        snapshot.held_item.count, snapshot.held_item.id
                    )
                }
            };
            (field.command_for(name), entity_reply(name, &value))
        })
        .collect()
}

/// Command channel that answers from per-command scripts and records every
/// command it was asked to send.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    queued: HashMap<String, VecDeque<Result<String>>>,
    standing: HashMap<String, String>,
    sent: Vec<String>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers the next send of `command` once, ahead of any standing reply.
    pub fn reply_once(&mut self, command: &str, reply: impl Into<String>) -> &mut Self {
        self.queued
            .entry(command.to_owned())
            .or_default()
            .push_back(Ok(reply.into()));
        self
    }

    pub fn fail_once(&mut self, command: &str, details: &str) -> &mut Self {
        self.queued
            .entry(command.to_owned())
            .or_default()
            .push_back(Err(ConsoleError::channel(command, details)));
        self
    }

    /// Answers every send of `command` that has no queued reply.
    pub fn reply_always(&mut self, command: &str, reply: impl Into<String>) -> &mut Self {
        self.standing.insert(command.to_owned(), reply.into());
        self
    }

    pub fn serve_roster(&mut self, players: &[&str]) -> &mut Self {
        self.reply_always(ROSTER_COMMAND, roster_reply(players, 20))
    }

    pub fn serve_player(&mut self, snapshot: &PlayerSnapshot) -> &mut Self {
        for (command, reply) in detail_replies(snapshot) {
            self.reply_always(&command, reply);
        }
        self
    }

    /// Standing replies for every poll command.
    pub fn serve_healthy_server(&mut self, players: &[&str]) -> &mut Self {
        self.serve_roster(players)
            .reply_always("time query daytime", time_reply(6_000))
            .reply_always("tps", tps_reply(20.0, 19.9, 19.8))
            .reply_always("version", version_reply("Paper", "1.21.4"))
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn count_sent(&self, command: &str) -> usize {
        self.sent.iter().filter(|sent| *sent == command).count()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl CommandChannel for ScriptedChannel {
    fn send(&mut self, command: &str) -> Result<String> {
        self.sent.push(command.to_owned());
        if let Some(reply) = self
            .queued
            .get_mut(command)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.standing
            .get(command)
            .cloned()
            .ok_or_else(|| ConsoleError::channel(command, "no scripted reply"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    pub status: Option<ServerStatus>,
    pub calls: usize,
}

impl ScriptedProbe {
    pub fn answering(status: ServerStatus) -> Self {
        Self {
            status: Some(status),
            calls: 0,
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }
}

impl StatusProbe for ScriptedProbe {
    fn probe(&mut self) -> Result<ServerStatus> {
        self.calls += 1;
        self.status
            .clone()
            .ok_or_else(|| ConsoleError::channel("status ping", "connection refused"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ScriptedChannel, ServerFaker, roster_reply};
    use mcadmin_app::CommandChannel;
    use mcadmin_app::decode::decode_roster;

    #[test]
    fn new_deterministic_seed() {
        let mut left = ServerFaker::new(42);
        let mut right = ServerFaker::new(42);
        assert_eq!(left.roster(5), right.roster(5));
    }

    #[test]
    fn roster_names_are_distinct_and_valid() {
        let mut faker = ServerFaker::new(7);
        let roster = faker.roster(10);
        assert_eq!(roster.len(), 10);
        for name in &roster {
            assert!(mcadmin_app::validate_player_name(name).is_ok(), "{name}");
            assert_eq!(roster.iter().filter(|other| *other == name).count(), 1);
        }
    }

    #[test]
    fn snapshot_ranges() {
        let mut faker = ServerFaker::new(3);
        for _ in 0..50 {
            let snapshot = faker.player_snapshot("Steve");
            assert!((1.0..=20.0).contains(&snapshot.health));
            assert!((0..=20).contains(&snapshot.food_level));
            assert!((0.0..1.0).contains(&snapshot.xp_progress));
        }
    }

    #[test]
    fn roster_reply_decodes_back() {
        let reply = roster_reply(&["Steve", "Alex"], 20);
        assert_eq!(decode_roster(&reply), vec!["Steve", "Alex"]);
    }

    #[test]
    fn queued_replies_take_precedence_over_standing() {
        let mut channel = ScriptedChannel::new();
        channel
            .reply_always("list", "standing")
            .reply_once("list", "first")
            .fail_once("list", "reset");

        assert_eq!(channel.send("list").as_deref(), Ok("first"));
        assert!(channel.send("list").is_err());
        assert_eq!(channel.send("list").as_deref(), Ok("standing"));
        assert!(channel.send("stop").is_err());
        assert_eq!(channel.count_sent("list"), 3);
        assert_eq!(channel.sent().len(), 4);
    }
}
