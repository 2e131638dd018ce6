// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use mcadmin_net::ping::{read_varint, write_varint};
use mcadmin_net::rcon::Packet;
use mcadmin_net::{MAX_REPLY_FRAGMENT_BYTES, RconClient, ping_status};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

fn reply(stream: &mut TcpStream, id: i32, kind: i32, body: &str) {
    let packet = Packet {
        id,
        kind,
        body: body.to_owned(),
    };
    stream
        .write_all(&packet.encode())
        .expect("mock reply should write");
}

fn accept_authenticated(listener: &TcpListener, password: &str) -> TcpStream {
    let (mut stream, _) = listener.accept().expect("client should connect");
    let login = Packet::read_from(&mut stream).expect("auth packet expected");
    assert_eq!(login.kind, 3);
    if login.body == password {
        reply(&mut stream, login.id, 0, "");
        reply(&mut stream, login.id, 2, "");
    } else {
        reply(&mut stream, -1, 2, "");
    }
    stream
}

/// Reads one exec request and the end marker behind it, then answers the
/// request with `fragments` and the marker the way a vanilla server does.
fn answer_exec(stream: &mut TcpStream, expected: &str, fragments: &[&str]) {
    let request = Packet::read_from(stream).expect("exec packet expected");
    assert_eq!(request.kind, 2);
    assert_eq!(request.body, expected);
    let marker = Packet::read_from(stream).expect("end marker expected");
    assert_eq!(marker.kind, 0);
    assert_ne!(marker.id, request.id);
    for fragment in fragments {
        reply(stream, request.id, 0, fragment);
    }
    reply(stream, marker.id, 0, "Unknown request 0");
}

#[test]
fn execute_round_trips_commands_in_order() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();

    let handle = thread::spawn(move || {
        let mut stream = accept_authenticated(&listener, "hunter2");
        for expected in ["list", "time query daytime"] {
            answer_exec(&mut stream, expected, &[&format!("reply to {expected}")]);
        }
    });

    let mut client = RconClient::connect(&addr, "hunter2", TIMEOUT)?;
    assert_eq!(client.execute("list")?, "reply to list");
    assert_eq!(client.execute("time query daytime")?, "reply to time query daytime");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fragmented_reply_is_joined() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    let first = "a".repeat(MAX_REPLY_FRAGMENT_BYTES);
    let second = "b".repeat(MAX_REPLY_FRAGMENT_BYTES);

    let handle = {
        let (first, second) = (first.clone(), second.clone());
        thread::spawn(move || {
            let mut stream = accept_authenticated(&listener, "pw");
            answer_exec(&mut stream, "help", &[&first, &second, "tail"]);
            answer_exec(&mut stream, "list", &["There are 0 of a max of 20 players online: "]);
        })
    };

    let mut client = RconClient::connect(&addr, "pw", TIMEOUT)?;
    let help = client.execute("help")?;
    assert_eq!(help.len(), 2 * MAX_REPLY_FRAGMENT_BYTES + 4);
    assert_eq!(help, format!("{first}{second}tail"));
    assert_eq!(
        client.execute("list")?,
        "There are 0 of a max of 20 players online: "
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn empty_reply_ends_at_the_marker() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    let handle = thread::spawn(move || {
        let mut stream = accept_authenticated(&listener, "pw");
        answer_exec(&mut stream, "save-all", &[]);
    });

    let mut client = RconClient::connect(&addr, "pw", TIMEOUT)?;
    assert_eq!(client.execute("save-all")?, "");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn wrong_password_is_reported() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    let handle = thread::spawn(move || {
        accept_authenticated(&listener, "correct");
    });

    let error = RconClient::connect(&addr, "wrong", TIMEOUT).expect_err("login should fail");
    assert!(error.to_string().contains("authentication failed"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn oversized_command_is_rejected_locally() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    let handle = thread::spawn(move || {
        accept_authenticated(&listener, "pw");
    });

    let mut client = RconClient::connect(&addr, "pw", TIMEOUT)?;
    let error = client
        .execute(&"say ".repeat(500))
        .expect_err("long command should fail");
    assert!(error.to_string().contains("at most"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn closed_connection_surfaces_as_error() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    let handle = thread::spawn(move || {
        let stream = accept_authenticated(&listener, "pw");
        drop(stream);
    });

    let mut client = RconClient::connect(&addr, "pw", TIMEOUT)?;
    handle.join().expect("server thread should join");
    assert!(client.execute("list").is_err());
    Ok(())
}

#[test]
fn unreachable_server_names_the_address() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr").to_string();
    drop(listener);

    let error = RconClient::connect(&addr, "pw", TIMEOUT).expect_err("connect should fail");
    assert!(error.to_string().contains(&addr));
}

fn read_frame(stream: &mut TcpStream) -> (i32, Vec<u8>) {
    let length = read_varint(stream).expect("frame length") as usize;
    let mut body = vec![0_u8; length];
    stream.read_exact(&mut body).expect("frame body");
    let mut cursor = body.as_slice();
    let id = read_varint(&mut cursor).expect("frame id");
    (id, cursor.to_vec())
}

fn write_frame(stream: &mut TcpStream, id: i32, data: &[u8]) {
    let mut body = Vec::new();
    write_varint(&mut body, id);
    body.extend_from_slice(data);
    let mut framed = Vec::new();
    write_varint(&mut framed, body.len() as i32);
    framed.extend_from_slice(&body);
    stream.write_all(&framed).expect("frame should write");
}

#[test]
fn status_ping_reads_json_and_measures_latency() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("client should connect");
        let (handshake_id, handshake) = read_frame(&mut stream);
        assert_eq!(handshake_id, 0);
        assert_eq!(*handshake.last().expect("next state byte"), 1);
        let (request_id, request) = read_frame(&mut stream);
        assert_eq!(request_id, 0);
        assert!(request.is_empty());

        let json = r#"{"version":{"name":"Paper 1.21.4","protocol":769},"players":{"max":50,"online":2},"description":{"text":"","extra":[{"text":"Survival "},{"text":"SMP"}]}}"#;
        let mut payload = Vec::new();
        write_varint(&mut payload, json.len() as i32);
        payload.extend_from_slice(json.as_bytes());
        write_frame(&mut stream, 0, &payload);

        let (ping_id, token) = read_frame(&mut stream);
        assert_eq!(ping_id, 1);
        write_frame(&mut stream, 1, &token);
    });

    let report = ping_status("127.0.0.1", port, TIMEOUT)?;
    assert_eq!(report.version_name, "Paper 1.21.4");
    assert_eq!(report.online, 2);
    assert_eq!(report.max, 50);
    assert_eq!(report.motd, "Survival SMP");
    assert!(report.latency < TIMEOUT);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn mismatched_pong_fails_the_ping() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("client should connect");
        read_frame(&mut stream);
        read_frame(&mut stream);
        let json = "{}";
        let mut payload = Vec::new();
        write_varint(&mut payload, json.len() as i32);
        payload.extend_from_slice(json.as_bytes());
        write_frame(&mut stream, 0, &payload);
        read_frame(&mut stream);
        write_frame(&mut stream, 1, &[0; 8]);
    });

    let error = ping_status("127.0.0.1", port, TIMEOUT).expect_err("pong should mismatch");
    assert!(error.to_string().contains("pong"));

    handle.join().expect("server thread should join");
    Ok(())
}
