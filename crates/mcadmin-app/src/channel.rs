// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::Result;

pub const ROSTER_COMMAND: &str = "list";
pub const WORLD_TIME_COMMAND: &str = "time query daytime";
pub const PERFORMANCE_COMMAND: &str = "tps";
pub const VERSION_COMMAND: &str = "version";

/// Entity data paths read for the player popup, in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Position,
    Health,
    FoodLevel,
    XpLevel,
    XpProgress,
    Dimension,
    HeldItem,
}

impl PlayerField {
    pub const ALL: [Self; 7] = [
        Self::Position,
        Self::Health,
        Self::FoodLevel,
        Self::XpLevel,
        Self::XpProgress,
        Self::Dimension,
        Self::HeldItem,
    ];

    pub const fn data_path(self) -> &'static str {
        match self {
            Self::Position => "Pos",
            Self::Health => "Health",
            Self::FoodLevel => "foodLevel",
            Self::XpLevel => "XpLevel",
            Self::XpProgress => "XpP",
            Self::Dimension => "Dimension",
            Self::HeldItem => "SelectedItem",
        }
    }

    pub fn command_for(self, player: &str) -> String {
        format!("data get entity {player} {}", self.data_path())
    }
}

/// One request, one reply. Implementations hold a single connection and
/// never pipeline.
pub trait CommandChannel {
    fn send(&mut self, command: &str) -> Result<String>;
}

impl<T: CommandChannel + ?Sized> CommandChannel for &mut T {
    fn send(&mut self, command: &str) -> Result<String> {
        (**self).send(command)
    }
}

impl<T: CommandChannel + ?Sized> CommandChannel for Box<T> {
    fn send(&mut self, command: &str) -> Result<String> {
        (**self).send(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerStatus {
    pub version_name: String,
    pub online: i64,
    pub max: i64,
    pub motd: String,
    pub ping_ms: i64,
}

impl ServerStatus {
    pub fn slots_label(&self) -> String {
        format!("{}/{}", self.online, self.max)
    }
}

/// Out-of-band status query against the game port (ping, MOTD, slots).
pub trait StatusProbe {
    fn probe(&mut self) -> Result<ServerStatus>;
}

impl<T: StatusProbe + ?Sized> StatusProbe for Box<T> {
    fn probe(&mut self) -> Result<ServerStatus> {
        (**self).probe()
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerField;

    #[test]
    fn player_field_commands_use_entity_data_paths() {
        let commands = PlayerField::ALL
            .iter()
            .map(|field| field.command_for("Steve"))
            .collect::<Vec<String>>();
        assert_eq!(
            commands,
            vec![
                "data get entity Steve Pos",
                "data get entity Steve Health",
                "data get entity Steve foodLevel",
                "data get entity Steve XpLevel",
                "data get entity Steve XpP",
                "data get entity Steve Dimension",
                "data get entity Steve SelectedItem",
            ]
        );
    }
}
