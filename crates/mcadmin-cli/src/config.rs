// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "mcadmin";
pub const CONFIG_PATH_ENV: &str = "MCADMIN_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_RCON_PORT: u16 = 25575;
const DEFAULT_QUERY_PORT: u16 = 25565;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_REFRESH_TICKS: u32 = mcadmin_app::DEFAULT_REFRESH_TICKS;
const DEFAULT_TICK_MS: u64 = 1_000;
const MIN_TICK_MS: u64 = 100;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    pub host: Option<String>,
    pub rcon_port: Option<u16>,
    pub query_port: Option<u16>,
    pub status_probe: Option<bool>,
    pub password: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub refresh_ticks: Option<u32>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub file: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [server], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(host) = &self.server.host
            && host.trim().is_empty()
        {
            bail!("server.host in {} must not be empty", path.display());
        }

        for (key, port) in [
            ("rcon_port", self.server.rcon_port),
            ("query_port", self.server.query_port),
        ] {
            if port == Some(0) {
                bail!("server.{key} in {} must be non-zero", path.display());
            }
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if self.ui.refresh_ticks == Some(0) {
            bail!(
                "ui.refresh_ticks in {} must be at least 1",
                path.display()
            );
        }

        if let Some(tick_ms) = self.ui.tick_ms
            && tick_ms < MIN_TICK_MS
        {
            bail!(
                "ui.tick_ms in {} must be at least {MIN_TICK_MS}, got {tick_ms}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join("/")
            );
        }

        Ok(())
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn rcon_port(&self) -> u16 {
        self.server.rcon_port.unwrap_or(DEFAULT_RCON_PORT)
    }

    pub fn query_port(&self) -> u16 {
        self.server.query_port.unwrap_or(DEFAULT_QUERY_PORT)
    }

    pub fn status_probe(&self) -> bool {
        self.server.status_probe.unwrap_or(true)
    }

    pub fn password(&self) -> Option<&str> {
        self.server.password.as_deref()
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.server.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn refresh_ticks(&self) -> u32 {
        self.ui.refresh_ticks.unwrap_or(DEFAULT_REFRESH_TICKS)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.ui.tick_ms.unwrap_or(DEFAULT_TICK_MS))
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_ref().map(PathBuf::from)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# mcadmin config\n# Place this file at: {}\n\nversion = 1\n\n[server]\nhost = \"{DEFAULT_HOST}\"\nrcon_port = {DEFAULT_RCON_PORT}\nquery_port = {DEFAULT_QUERY_PORT}\n# Ping the game port for latency, MOTD, and slots.\nstatus_probe = true\ntimeout = \"{DEFAULT_TIMEOUT}\"\n# Prefer MCADMIN_RCON_PASSWORD over storing the password here.\n# password = \"\"\n\n[ui]\nrefresh_ticks = {DEFAULT_REFRESH_TICKS}\ntick_ms = {DEFAULT_TICK_MS}\n\n[log]\n# Optional. No file means no diagnostic log.\n# file = \"/tmp/mcadmin.log\"\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n",
            path.display(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use <N>ms or <N>s (for example 500ms or 5s)")
}
