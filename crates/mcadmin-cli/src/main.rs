// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use mcadmin_app::{CommandChannel, ConsoleState, Engine, Poller, RosterTracker, StatusProbe};
use mcadmin_net::RconClient;
use mcadmin_tui::UiOptions;
use runtime::{RconChannel, StatusPinger};
use std::env;
use std::path::PathBuf;
use tracing::info;

const PASSWORD_ENV: &str = "MCADMIN_RCON_PASSWORD";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `mcadmin --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    let _log_guard = logging::init_logging(config.log_file().as_deref(), config.log_level())?;

    let host = options.host.as_deref().unwrap_or(config.host()).to_owned();
    let port = options.port.unwrap_or(config.rcon_port());
    let password = resolve_password(
        options.password.as_deref(),
        env::var(PASSWORD_ENV).ok(),
        config.password(),
    )?;
    let timeout = config.timeout()?;

    let addr = format!("{host}:{port}");
    let client = RconClient::connect(&addr, &password, timeout).with_context(|| {
        format!("connect to {addr} -- check --host/--port and that enable-rcon=true is set")
    })?;
    info!(addr = %addr, "rcon session established");

    let mut channel = RconChannel::new(client);
    let mut probe = config
        .status_probe()
        .then(|| StatusPinger::new(&host, config.query_port(), timeout));

    if options.check_only {
        println!("{}", check_once(&mut channel, probe.as_mut(), &addr)?);
        return Ok(());
    }

    let mut state = ConsoleState::with_refresh_ticks(config.refresh_ticks());
    let mut engine = Engine::new(channel, probe);
    let ui = UiOptions {
        tick: config.tick(),
        server_label: addr,
    };
    mcadmin_tui::run_app(&mut state, &mut engine, &ui)
}

/// Runs a single poll cycle and summarizes it in one line.
fn check_once<C, P>(channel: &mut C, probe: Option<&mut P>, addr: &str) -> Result<String>
where
    C: CommandChannel,
    P: StatusProbe,
{
    let report = Poller::new()
        .cycle(channel, probe, &RosterTracker::default())
        .with_context(|| format!("poll {addr}"))?;
    let snapshot = report.snapshot;
    Ok(format!(
        "{addr}: {} | {} players | {}",
        snapshot.version_label, snapshot.slots_label, snapshot.clock_label
    ))
}

/// Picks the first password source that is set: flag, then environment,
/// then config file. An empty value is rejected rather than skipped.
fn resolve_password(
    flag: Option<&str>,
    from_env: Option<String>,
    from_config: Option<&str>,
) -> Result<String> {
    let password = flag
        .map(str::to_owned)
        .or(from_env)
        .or_else(|| from_config.map(str::to_owned))
        .ok_or_else(|| {
            anyhow!("no RCON password; pass --pass, set {PASSWORD_ENV}, or set [server].password")
        })?;
    if password.is_empty() {
        bail!("RCON password is empty; pass --pass, set {PASSWORD_ENV}, or set [server].password");
    }
    Ok(password)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        host: None,
        port: None,
        password: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--host" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--host requires a hostname or address"))?;
                options.host = Some(value.as_ref().to_owned());
            }
            "--port" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--port requires a port number"))?;
                let port: u16 = value
                    .as_ref()
                    .parse()
                    .with_context(|| format!("invalid --port {:?}", value.as_ref()))?;
                if port == 0 {
                    bail!("--port must be between 1 and 65535");
                }
                options.port = Some(port);
            }
            "--pass" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--pass requires the RCON password"))?;
                options.password = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("mcadmin: Minecraft server console over RCON");
    println!("  --host <host>            RCON host (default 127.0.0.1)");
    println!("  --port <port>            RCON port (default 25575)");
    println!("  --pass <password>        RCON password (or {PASSWORD_ENV})");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Connect, log in, poll once, and exit");
    println!("  --help                   Show this help");
}
