// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use mcadmin_app::error::Result;
use mcadmin_app::{CommandChannel, ConsoleError, ServerStatus, StatusProbe};
use mcadmin_net::{RconClient, StatusReport, ping_status};
use std::time::Duration;
use tracing::debug;

/// Anything that can execute one RCON command and return its reply.
pub trait RconExec {
    fn execute(&mut self, command: &str) -> anyhow::Result<String>;
}

impl RconExec for RconClient {
    fn execute(&mut self, command: &str) -> anyhow::Result<String> {
        RconClient::execute(self, command)
    }
}

/// Adapts an RCON session to the console's command channel, folding
/// transport errors into `ConsoleError::Channel`.
pub struct RconChannel<E> {
    exec: E,
}

impl<E: RconExec> RconChannel<E> {
    pub fn new(exec: E) -> Self {
        Self { exec }
    }
}

impl<E: RconExec> CommandChannel for RconChannel<E> {
    fn send(&mut self, command: &str) -> Result<String> {
        debug!(command, "rcon send");
        self.exec
            .execute(command)
            .map_err(|error| ConsoleError::channel(command, format!("{error:#}")))
    }
}

pub struct StatusPinger {
    host: String,
    port: u16,
    timeout: Duration,
}

impl StatusPinger {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_owned(),
            port,
            timeout,
        }
    }
}

impl StatusProbe for StatusPinger {
    fn probe(&mut self) -> Result<ServerStatus> {
        ping_status(&self.host, self.port, self.timeout)
            .map(status_from_report)
            .map_err(|error| ConsoleError::channel("status ping", format!("{error:#}")))
    }
}

fn status_from_report(report: StatusReport) -> ServerStatus {
    ServerStatus {
        version_name: report.version_name,
        online: report.online,
        max: report.max,
        motd: report.motd,
        ping_ms: i64::try_from(report.latency.as_millis()).unwrap_or(i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::{RconChannel, RconExec, status_from_report};
    use anyhow::{Result, bail};
    use mcadmin_app::{CommandChannel, ErrorKind};
    use mcadmin_net::StatusReport;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeRcon {
        sent: Vec<String>,
    }

    impl RconExec for FakeRcon {
        fn execute(&mut self, command: &str) -> Result<String> {
            self.sent.push(command.to_owned());
            if command == "stop" {
                bail!("connection reset by peer");
            }
            Ok(format!("ok: {command}"))
        }
    }

    #[test]
    fn channel_passes_commands_through() -> Result<()> {
        let mut channel = RconChannel::new(FakeRcon::default());
        assert_eq!(channel.send("list")?, "ok: list");
        assert_eq!(channel.exec.sent, vec!["list"]);
        Ok(())
    }

    #[test]
    fn transport_errors_become_channel_errors() {
        let mut channel = RconChannel::new(FakeRcon::default());
        let error = channel.send("stop").expect_err("stop should fail");
        assert_eq!(error.kind(), ErrorKind::ChannelError);
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn report_latency_becomes_ping_millis() {
        let status = status_from_report(StatusReport {
            version_name: "Paper 1.21.4".to_owned(),
            protocol: 769,
            online: 1,
            max: 20,
            motd: "hi".to_owned(),
            latency: Duration::from_micros(12_900),
        });
        assert_eq!(status.ping_ms, 12);
        assert_eq!(status.slots_label(), "1/20");
    }
}
