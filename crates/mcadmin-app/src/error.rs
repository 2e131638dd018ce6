// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    DecodeFailure,
    ChannelError,
    InvalidInput,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::DecodeFailure => "decode",
            Self::ChannelError => "channel",
            Self::InvalidInput => "input",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("connection failed: {details}")]
    Connection { details: String },

    #[error("cannot decode {expected} from {raw:?}")]
    Decode { expected: &'static str, raw: String },

    #[error("command {command:?} failed: {details}")]
    Channel { command: String, details: String },

    #[error("refusing to build command for player name {name:?}")]
    InvalidPlayerName { name: String },
}

impl ConsoleError {
    pub fn decode(expected: &'static str, raw: &str) -> Self {
        Self::Decode {
            expected,
            raw: raw.to_owned(),
        }
    }

    pub fn channel(command: &str, details: impl Into<String>) -> Self {
        Self::Channel {
            command: command.to_owned(),
            details: details.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Decode { .. } => ErrorKind::DecodeFailure,
            Self::Channel { .. } => ErrorKind::ChannelError,
            Self::InvalidPlayerName { .. } => ErrorKind::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
