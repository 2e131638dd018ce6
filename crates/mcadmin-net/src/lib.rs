// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod ping;
pub mod rcon;

pub use ping::{StatusReport, ping_status};
pub use rcon::{MAX_COMMAND_BYTES, MAX_REPLY_FRAGMENT_BYTES, RconClient};
