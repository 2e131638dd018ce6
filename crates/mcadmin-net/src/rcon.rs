// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, trace};

const PACKET_AUTH: i32 = 3;
const PACKET_EXEC: i32 = 2;
const PACKET_AUTH_RESPONSE: i32 = 2;
const PACKET_RESPONSE: i32 = 0;

/// Header bytes counted by the length prefix: request id, type, two NULs.
const PACKET_OVERHEAD: usize = 10;
/// Largest command body vanilla servers accept.
pub const MAX_COMMAND_BYTES: usize = 1446;
/// Servers split longer replies across several response packets.
pub const MAX_REPLY_FRAGMENT_BYTES: usize = 4096;
const MAX_PACKET_BYTES: usize = MAX_REPLY_FRAGMENT_BYTES + PACKET_OVERHEAD;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        let length = (body.len() + PACKET_OVERHEAD) as i32;
        let mut out = Vec::with_capacity(body.len() + PACKET_OVERHEAD + 4);
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&self.kind.to_le_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(&[0, 0]);
        out
    }

    pub fn read_from(reader: &mut impl Read) -> Result<Self> {
        let length = read_i32(reader).context("read packet length")?;
        let length = usize::try_from(length).map_err(|_| anyhow!("negative packet length"))?;
        if !(PACKET_OVERHEAD..=MAX_PACKET_BYTES).contains(&length) {
            bail!("packet length {length} out of range");
        }

        let mut payload = vec![0_u8; length];
        reader
            .read_exact(&mut payload)
            .context("read packet payload")?;
        let id = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        let kind = i32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
        let body = &payload[8..length - 2];
        Ok(Self {
            id,
            kind,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

fn read_i32(reader: &mut impl Read) -> std::io::Result<i32> {
    let mut buf = [0_u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Blocking Source RCON session. One command in flight at a time.
#[derive(Debug)]
pub struct RconClient {
    stream: TcpStream,
    next_id: i32,
}

impl RconClient {
    pub fn connect(addr: &str, password: &str, timeout: Duration) -> Result<Self> {
        let stream = connect_stream(addr, timeout)?;
        let mut client = Self { stream, next_id: 1 };
        client.authenticate(password)?;
        debug!(addr, "rcon session authenticated");
        Ok(client)
    }

    pub fn execute(&mut self, command: &str) -> Result<String> {
        if command.len() > MAX_COMMAND_BYTES {
            bail!(
                "command is {} bytes, servers accept at most {MAX_COMMAND_BYTES}",
                command.len()
            );
        }
        let id = self.request(PACKET_EXEC, command)?;
        // Servers answer an unknown request type in order, after every
        // fragment of the reply before it, so its echo marks the end.
        let marker = self.request(PACKET_RESPONSE, "")?;
        let mut reply = String::new();
        loop {
            let packet = Packet::read_from(&mut self.stream)
                .with_context(|| format!("read reply to {command:?}"))?;
            if packet.id == id && packet.kind == PACKET_RESPONSE {
                reply.push_str(&packet.body);
            } else if packet.id == marker {
                trace!(command, bytes = reply.len(), "rcon reply");
                return Ok(reply);
            } else {
                trace!(id = packet.id, kind = packet.kind, "skipping unrelated rcon packet");
            }
        }
    }

    fn authenticate(&mut self, password: &str) -> Result<()> {
        let id = self.request(PACKET_AUTH, password)?;
        loop {
            let packet = Packet::read_from(&mut self.stream).context("read auth response")?;
            if packet.kind != PACKET_AUTH_RESPONSE {
                continue;
            }
            if packet.id == -1 {
                bail!("rcon authentication failed -- check the password");
            }
            if packet.id != id {
                bail!("rcon auth response id {} does not match {id}", packet.id);
            }
            return Ok(());
        }
    }

    fn request(&mut self, kind: i32, body: &str) -> Result<i32> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let packet = Packet {
            id,
            kind,
            body: body.to_owned(),
        };
        self.stream
            .write_all(&packet.encode())
            .context("write rcon packet")?;
        Ok(id)
    }
}

pub(crate) fn connect_stream(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let targets = addr
        .to_socket_addrs()
        .with_context(|| format!("resolve {addr}"))?;

    let mut last_error = None;
    for target in targets {
        match TcpStream::connect_timeout(&target, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(error) => last_error = Some(error),
        }
    }

    match last_error {
        Some(error) if error.kind() == ErrorKind::ConnectionRefused => {
            Err(anyhow!("cannot reach {addr} -- is the server running? ({error})"))
        }
        Some(error) => Err(anyhow!("cannot reach {addr}: {error}")),
        None => bail!("{addr} did not resolve to any address"),
    }
}

#[cfg(test)]
mod tests {
    use super::{PACKET_EXEC, Packet};
    use std::io::Cursor;

    #[test]
    fn encode_frames_body_with_trailing_nuls() {
        let bytes = Packet {
            id: 7,
            kind: PACKET_EXEC,
            body: "list".to_owned(),
        }
        .encode();
        assert_eq!(&bytes[..4], &14_i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &7_i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &2_i32.to_le_bytes());
        assert_eq!(&bytes[12..16], b"list");
        assert_eq!(&bytes[16..], &[0, 0]);
    }

    #[test]
    fn read_rejects_short_length() {
        let mut bytes = Cursor::new(4_i32.to_le_bytes().to_vec());
        assert!(Packet::read_from(&mut bytes).is_err());
    }

    #[test]
    fn read_decodes_encoded_packet() -> anyhow::Result<()> {
        let packet = Packet {
            id: 3,
            kind: 0,
            body: "There are 0 of a max of 20 players online: ".to_owned(),
        };
        let mut bytes = Cursor::new(packet.encode());
        assert_eq!(Packet::read_from(&mut bytes)?, packet);
        Ok(())
    }
}
