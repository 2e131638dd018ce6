// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::channel::{
    CommandChannel, PERFORMANCE_COMMAND, ROSTER_COMMAND, StatusProbe, VERSION_COMMAND,
    WORLD_TIME_COMMAND,
};
use crate::decode::{decode_clock, decode_performance, decode_roster, decode_slots, decode_version};
use crate::error::Result;
use crate::model::ServerSnapshot;
use crate::roster::{RosterDiff, RosterTracker};

pub const DEFAULT_REFRESH_TICKS: u32 = 9;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollReport {
    pub snapshot: ServerSnapshot,
    pub changes: RosterDiff,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Poller {
    version_label: Option<String>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_label(&self) -> Option<&str> {
        self.version_label.as_deref()
    }

    /// Runs one full refresh. Nothing is committed here; the caller applies
    /// the report only when every step succeeded.
    pub fn cycle<C, P>(
        &mut self,
        channel: &mut C,
        probe: Option<&mut P>,
        roster: &RosterTracker,
    ) -> Result<PollReport>
    where
        C: CommandChannel + ?Sized,
        P: StatusProbe + ?Sized,
    {
        let roster_reply = channel.send(ROSTER_COMMAND)?;
        let players = decode_roster(&roster_reply);
        let changes = roster.diff_against(&players);

        let clock_label = decode_clock(&channel.send(WORLD_TIME_COMMAND)?);
        let tps = decode_performance(&channel.send(PERFORMANCE_COMMAND)?);
        let version_label = self.ensure_version(channel)?;

        let mut snapshot = ServerSnapshot {
            slots_label: decode_slots(&roster_reply),
            players,
            version_label,
            clock_label,
            tps,
            ..ServerSnapshot::default()
        };

        if let Some(probe) = probe {
            let status = probe.probe()?;
            snapshot.ping_ms = status.ping_ms;
            snapshot.slots_label = status.slots_label();
            snapshot.motd = status.motd;
            if snapshot.version_label.is_empty() {
                snapshot.version_label = status.version_name;
            }
        }

        debug!(
            players = snapshot.players.len(),
            joined = changes.joined.len(),
            left = changes.left.len(),
            "poll cycle decoded"
        );
        Ok(PollReport { snapshot, changes })
    }

    fn ensure_version<C>(&mut self, channel: &mut C) -> Result<String>
    where
        C: CommandChannel + ?Sized,
    {
        if let Some(label) = &self.version_label {
            return Ok(label.clone());
        }
        let label = decode_version(&channel.send(VERSION_COMMAND)?);
        self.version_label = Some(label.clone());
        Ok(label)
    }
}
