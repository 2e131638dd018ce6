// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::channel::{CommandChannel, PlayerField, ROSTER_COMMAND};
use crate::decode::{
    decode_dimension, decode_food_level, decode_health, decode_held_item, decode_position,
    decode_roster, decode_xp_level, decode_xp_progress,
};
use crate::error::Result;
use crate::model::{PlayerSnapshot, validate_player_name};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailReport {
    Online(PlayerSnapshot),
    Offline { player: String },
}

/// Re-checks the roster, then reads every popup field in order. The first
/// failing step ends the fetch and nothing decoded so far is returned.
pub fn fetch_player<C>(channel: &mut C, player: &str) -> Result<DetailReport>
where
    C: CommandChannel + ?Sized,
{
    validate_player_name(player)?;

    let roster = decode_roster(&channel.send(ROSTER_COMMAND)?);
    if !roster.iter().any(|name| name == player) {
        debug!(player, "player left before detail fetch");
        return Ok(DetailReport::Offline {
            player: player.to_owned(),
        });
    }

    let mut read = |field: PlayerField| channel.send(&field.command_for(player));

    let position = decode_position(&read(PlayerField::Position)?)?;
    let health = decode_health(&read(PlayerField::Health)?)?;
    let food_level = decode_food_level(&read(PlayerField::FoodLevel)?)?;
    let xp_level = decode_xp_level(&read(PlayerField::XpLevel)?)?;
    let xp_progress = decode_xp_progress(&read(PlayerField::XpProgress)?)?;
    let dimension = decode_dimension(&read(PlayerField::Dimension)?)?;
    let held_item = decode_held_item(&read(PlayerField::HeldItem)?)?;

    Ok(DetailReport::Online(PlayerSnapshot {
        name: player.to_owned(),
        position,
        health,
        food_level,
        xp_level,
        xp_progress,
        dimension,
        held_item,
    }))
}

#[cfg(test)]
mod tests {
    use super::{DetailReport, fetch_player};
    use crate::channel::CommandChannel;
    use crate::error::{ConsoleError, ErrorKind, Result};
    use crate::model::{ItemStack, Vector3};
    use std::collections::VecDeque;

    struct QueueChannel {
        replies: VecDeque<&'static str>,
        sent: Vec<String>,
    }

    impl QueueChannel {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                sent: Vec::new(),
            }
        }
    }

    impl CommandChannel for QueueChannel {
        fn send(&mut self, command: &str) -> Result<String> {
            self.sent.push(command.to_owned());
            self.replies
                .pop_front()
                .map(str::to_owned)
                .ok_or_else(|| ConsoleError::channel(command, "connection closed"))
        }
    }

    const FULL_REPLIES: [&str; 8] = [
        "There are 1 of a max of 20 players online: Steve",
        "Steve has the following entity data: [12.5d, 64.0d, -8.25d]",
        "Steve has the following entity data: 18.5f",
        "Steve has the following entity data: 17",
        "Steve has the following entity data: 30",
        "Steve has the following entity data: 0.5f",
        r#"Steve has the following entity data: "minecraft:overworld""#,
        r#"Steve has the following entity data: {count: 64, id: "minecraft:cobblestone"}"#,
    ];

    #[test]
    fn fetch_reads_every_field_in_order() -> Result<()> {
        let mut channel = QueueChannel::new(&FULL_REPLIES);

        let DetailReport::Online(snapshot) = fetch_player(&mut channel, "Steve")? else {
            panic!("player should be online");
        };
        assert_eq!(snapshot.name, "Steve");
        assert_eq!(snapshot.position, Vector3::new(12.5, 64.0, -8.25));
        assert_eq!(snapshot.health, 18.5);
        assert_eq!(snapshot.food_level, 17);
        assert_eq!(snapshot.xp_level, 30);
        assert_eq!(snapshot.xp_progress, 0.5);
        assert_eq!(snapshot.dimension, "overworld");
        assert_eq!(
            snapshot.held_item,
            ItemStack {
                id: "minecraft:cobblestone".to_owned(),
                count: 64,
                is_empty: false,
                has_extra_data: false,
            }
        );
        assert_eq!(
            channel.sent,
            vec![
                "list",
                "data get entity Steve Pos",
                "data get entity Steve Health",
                "data get entity Steve foodLevel",
                "data get entity Steve XpLevel",
                "data get entity Steve XpP",
                "data get entity Steve Dimension",
                "data get entity Steve SelectedItem",
            ]
        );
        Ok(())
    }

    #[test]
    fn absent_player_stops_after_roster_check() -> Result<()> {
        let mut channel = QueueChannel::new(&["There are 1 of a max of 20 players online: Alex"]);
        let report = fetch_player(&mut channel, "Steve")?;
        assert_eq!(
            report,
            DetailReport::Offline {
                player: "Steve".to_owned()
            }
        );
        assert_eq!(channel.sent, vec!["list"]);
        Ok(())
    }

    #[test]
    fn first_decode_failure_aborts_remaining_steps() {
        let mut channel = QueueChannel::new(&[
            FULL_REPLIES[0],
            FULL_REPLIES[1],
            "No entity was found",
            FULL_REPLIES[3],
        ]);
        let error = fetch_player(&mut channel, "Steve").expect_err("health should fail");
        assert_eq!(error.kind(), ErrorKind::DecodeFailure);
        assert_eq!(channel.sent.len(), 3);
    }

    #[test]
    fn channel_failure_mid_fetch_is_reported() {
        let mut channel = QueueChannel::new(&FULL_REPLIES[..4]);
        let error = fetch_player(&mut channel, "Steve").expect_err("channel should fail");
        assert_eq!(error.kind(), ErrorKind::ChannelError);
        assert_eq!(channel.sent.len(), 5);
    }

    #[test]
    fn unsafe_names_are_rejected_before_any_command() {
        let mut channel = QueueChannel::new(&FULL_REPLIES);
        let error = fetch_player(&mut channel, "Steve @a").expect_err("name should fail");
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(channel.sent.is_empty());
    }
}
