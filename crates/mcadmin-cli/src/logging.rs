// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "MCADMIN_LOG";

/// Routes `tracing` output to `file`, or discards it when there is none; the
/// terminal belongs to the console. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init_logging(file: Option<&Path>, level: &str) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(std::env::var(LOG_FILTER_ENV).ok().as_deref(), level);

    let Some(path) = file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init()
            .map_err(|error| anyhow!("configure logger: {error}"))?;
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- fix [log].file or remove it",
                path.display()
            )
        })?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .try_init()
        .map_err(|error| anyhow!("configure logger: {error}"))?;
    Ok(Some(guard))
}

fn build_filter(from_env: Option<&str>, level: &str) -> EnvFilter {
    match from_env.filter(|value| !value.trim().is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(level),
    }
}
