// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod channel;
pub mod decode;
pub mod detail;
pub mod engine;
pub mod error;
pub mod model;
pub mod poller;
pub mod roster;
pub mod state;

pub use channel::*;
pub use detail::*;
pub use engine::*;
pub use error::{ConsoleError, ErrorKind};
pub use model::*;
pub use poller::*;
pub use roster::*;
pub use state::*;
