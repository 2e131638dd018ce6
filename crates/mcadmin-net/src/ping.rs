// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Server List Ping: the unauthenticated status handshake every Java
//! edition client performs against the game port.

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::Value;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::rcon::connect_stream;

const HANDSHAKE_PACKET: i32 = 0x00;
const STATUS_REQUEST_PACKET: i32 = 0x00;
const PING_PACKET: i32 = 0x01;
const STATUS_NEXT_STATE: i32 = 1;
/// Servers answer the status request regardless of protocol; -1 is what
/// clients send when they do not know the server's version yet.
const PROTOCOL_UNKNOWN: i32 = -1;
const MAX_STATUS_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub version_name: String,
    pub protocol: i64,
    pub online: i64,
    pub max: i64,
    pub motd: String,
    pub latency: Duration,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    version: VersionInfo,
    #[serde(default)]
    players: PlayersInfo,
    #[serde(default)]
    description: Value,
}

#[derive(Debug, Default, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    protocol: i64,
}

#[derive(Debug, Default, Deserialize)]
struct PlayersInfo {
    #[serde(default)]
    max: i64,
    #[serde(default)]
    online: i64,
}

pub fn ping_status(host: &str, port: u16, timeout: Duration) -> Result<StatusReport> {
    let addr = format!("{host}:{port}");
    let mut stream = connect_stream(&addr, timeout)?;

    let mut handshake = Vec::new();
    write_varint(&mut handshake, PROTOCOL_UNKNOWN);
    write_string(&mut handshake, host);
    handshake.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut handshake, STATUS_NEXT_STATE);
    write_packet(&mut stream, HANDSHAKE_PACKET, &handshake).context("send handshake")?;
    write_packet(&mut stream, STATUS_REQUEST_PACKET, &[]).context("send status request")?;

    let (id, payload) = read_packet(&mut stream).context("read status response")?;
    if id != STATUS_REQUEST_PACKET {
        bail!("unexpected status packet id {id:#04x}");
    }
    let json = read_string(&mut payload.as_slice())?;
    let status = parse_status(&json)?;

    let token = 0x6d63_6164_6d69_6e_i64;
    let started = Instant::now();
    write_packet(&mut stream, PING_PACKET, &token.to_be_bytes()).context("send ping")?;
    let (id, payload) = read_packet(&mut stream).context("read pong")?;
    let latency = started.elapsed();
    if id != PING_PACKET || payload.as_slice() != token.to_be_bytes() {
        bail!("server answered ping with a mismatched pong");
    }

    debug!(addr = %addr, latency_ms = latency.as_millis() as u64, "status ping");
    Ok(StatusReport { latency, ..status })
}

pub fn parse_status(json: &str) -> Result<StatusReport> {
    let response: StatusResponse =
        serde_json::from_str(json).context("decode status response JSON")?;
    Ok(StatusReport {
        version_name: response.version.name,
        protocol: response.version.protocol,
        online: response.players.online,
        max: response.players.max,
        motd: flatten_text(&response.description),
        latency: Duration::ZERO,
    })
}

/// Joins a chat component tree (plain string, `{text, extra}` object, or
/// array) into its visible text.
pub fn flatten_text(component: &Value) -> String {
    let mut out = String::new();
    append_text(component, &mut out);
    out
}

fn append_text(component: &Value, out: &mut String) {
    match component {
        Value::String(text) => out.push_str(text),
        Value::Array(parts) => parts.iter().for_each(|part| append_text(part, out)),
        Value::Object(fields) => {
            if let Some(Value::String(text)) = fields.get("text") {
                out.push_str(text);
            }
            if let Some(extra) = fields.get("extra") {
                append_text(extra, out);
            }
        }
        _ => {}
    }
}

pub fn write_varint(out: &mut Vec<u8>, value: i32) {
    let mut remaining = value as u32;
    loop {
        let byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn read_varint(reader: &mut impl Read) -> Result<i32> {
    let mut value = 0_u32;
    for shift in (0..35).step_by(7) {
        let mut byte = [0_u8; 1];
        reader.read_exact(&mut byte).context("read varint")?;
        value |= u32::from(byte[0] & 0x7f) << shift;
        if byte[0] & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(anyhow!("varint is longer than 5 bytes"))
}

fn write_string(out: &mut Vec<u8>, text: &str) {
    write_varint(out, text.len() as i32);
    out.extend_from_slice(text.as_bytes());
}

fn read_string(reader: &mut impl Read) -> Result<String> {
    let length = read_length(reader)?;
    let mut bytes = vec![0_u8; length];
    reader.read_exact(&mut bytes).context("read string")?;
    String::from_utf8(bytes).context("status string is not UTF-8")
}

fn read_length(reader: &mut impl Read) -> Result<usize> {
    let length = read_varint(reader)?;
    let length = usize::try_from(length).map_err(|_| anyhow!("negative length {length}"))?;
    if length > MAX_STATUS_BYTES {
        bail!("length {length} exceeds {MAX_STATUS_BYTES} bytes");
    }
    Ok(length)
}

fn write_packet(writer: &mut impl Write, id: i32, data: &[u8]) -> Result<()> {
    let mut body = Vec::with_capacity(data.len() + 5);
    write_varint(&mut body, id);
    body.extend_from_slice(data);

    let mut framed = Vec::with_capacity(body.len() + 5);
    write_varint(&mut framed, body.len() as i32);
    framed.extend_from_slice(&body);
    writer.write_all(&framed)?;
    Ok(())
}

fn read_packet(reader: &mut impl Read) -> Result<(i32, Vec<u8>)> {
    let length = read_length(reader)?;
    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body).context("read packet body")?;
    let mut cursor = body.as_slice();
    let id = read_varint(&mut cursor)?;
    Ok((id, cursor.to_vec()))
}
