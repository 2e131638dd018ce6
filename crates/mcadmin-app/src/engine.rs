// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::channel::{CommandChannel, StatusProbe};
use crate::detail::fetch_player;
use crate::poller::Poller;
use crate::state::{ConsoleEvent, ConsoleState, Effect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs the effects a [`ConsoleState`] asks for, one at a time, and feeds
/// each completion back in before the next input is read.
pub struct Engine<C, P> {
    channel: C,
    probe: Option<P>,
    poller: Poller,
}

impl<C, P> Engine<C, P>
where
    C: CommandChannel,
    P: StatusProbe,
{
    pub fn new(channel: C, probe: Option<P>) -> Self {
        Self {
            channel,
            probe,
            poller: Poller::new(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    pub fn handle(&mut self, state: &mut ConsoleState, event: ConsoleEvent) -> Flow {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for effect in state.dispatch(event) {
                match self.run(effect, state) {
                    Some(next) => pending.push_back(next),
                    None => return Flow::Quit,
                }
            }
        }
        Flow::Continue
    }

    /// Returns the completion event, or `None` when the effect is a quit.
    fn run(&mut self, effect: Effect, state: &ConsoleState) -> Option<ConsoleEvent> {
        debug!(?effect, "running effect");
        match effect {
            Effect::Poll => {
                let result = self
                    .poller
                    .cycle(&mut self.channel, self.probe.as_mut(), &state.roster);
                if let Err(error) = &result {
                    warn!(%error, "poll cycle failed");
                }
                Some(ConsoleEvent::PollFinished(result))
            }
            Effect::FetchDetail { player } => {
                let result = fetch_player(&mut self.channel, &player);
                if let Err(error) = &result {
                    warn!(%error, player = %player, "player detail fetch failed");
                }
                Some(ConsoleEvent::DetailFinished { player, result })
            }
            Effect::Send { command } => {
                let result = self.channel.send(&command);
                if let Err(error) = &result {
                    warn!(%error, command = %command, "command failed");
                }
                Some(ConsoleEvent::CommandFinished { command, result })
            }
            Effect::Quit => None,
        }
    }
}
