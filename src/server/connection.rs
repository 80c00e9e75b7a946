//! Connection Module
//!
//! Line-oriented command protocol served over a TCP stream.
//!
//! A worker drives one connection at a time through this handler: read a
//! line, parse it into a command, run it against the shared store, write
//! one reply line. The connection closes on peer disconnect, a read
//! error, or a failed authentication attempt.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::server::ServerState;

// == Command ==
/// A parsed protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a key-value pair
    Set { key: String, value: String },
    /// Fetch a value by key
    Get { key: String },
    /// Remove a key
    Del { key: String },
    /// Sample the store and queue counters
    Stats,
    /// Authenticate the connection
    Auth { password: String },
}

// == Parsing ==
/// Parses one input line into a command.
///
/// Returns None for blank lines (silently skipped). A malformed command
/// yields the error reply to send back; the connection stays open.
/// Verbs are case-insensitive.
fn parse_command(line: &str) -> Option<std::result::Result<Command, String>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let verb = parts.first()?;

    Some(match verb.to_ascii_uppercase().as_str() {
        "SET" => {
            if parts.len() < 3 {
                Err("ERROR: SET requires key and value".to_string())
            } else {
                Ok(Command::Set {
                    key: parts[1].to_string(),
                    // The value may contain spaces
                    value: parts[2..].join(" "),
                })
            }
        }
        "GET" => {
            if parts.len() < 2 {
                Err("ERROR: GET requires key".to_string())
            } else {
                Ok(Command::Get {
                    key: parts[1].to_string(),
                })
            }
        }
        "DEL" => {
            if parts.len() < 2 {
                Err("ERROR: DEL requires key".to_string())
            } else {
                Ok(Command::Del {
                    key: parts[1].to_string(),
                })
            }
        }
        "STATS" => Ok(Command::Stats),
        "AUTH" => Ok(Command::Auth {
            password: parts.get(1).unwrap_or(&"").to_string(),
        }),
        _ => Err("ERROR: unknown command".to_string()),
    })
}

// == Execution ==
/// Runs a command against the store and renders the reply line.
fn execute(state: &ServerState, command: Command) -> String {
    match command {
        Command::Set { key, value } => {
            state.store.set(&key, &value);
            "OK".to_string()
        }
        Command::Get { key } => match state.store.get(&key) {
            Ok(value) => value,
            Err(CacheError::NotFound(_)) => "ERROR: key not found".to_string(),
        },
        Command::Del { key } => {
            state.store.delete(&key);
            "OK".to_string()
        }
        Command::Stats => stats_reply(state),
        // AUTH outside the handshake is not a command
        Command::Auth { .. } => "ERROR: unknown command".to_string(),
    }
}

/// One-line JSON snapshot of the aggregate counters and queue depth.
#[derive(Debug, Serialize)]
struct StatsReply {
    sets: u64,
    hits: u64,
    misses: u64,
    deletes: u64,
    evictions: u64,
    entries: usize,
    hit_rate: f64,
    queue_depth: usize,
}

fn stats_reply(state: &ServerState) -> String {
    let stats = state.store.stats();
    let reply = StatsReply {
        sets: stats.sets,
        hits: stats.hits,
        misses: stats.misses,
        deletes: stats.deletes,
        evictions: stats.evictions,
        entries: stats.entries,
        hit_rate: stats.hit_rate(),
        queue_depth: state.queue_depth.get(),
    };
    serde_json::to_string(&reply).unwrap_or_else(|_| "ERROR: stats unavailable".to_string())
}

// == Connection Handler ==
/// Processes a client connection to completion.
///
/// Reads commands line by line until the peer closes or a fatal protocol
/// condition occurs. When authentication is enabled the connection must
/// present `AUTH <password>` before any other command; a wrong password
/// closes the connection.
pub async fn handle_connection(stream: TcpStream, state: ServerState) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut authenticated = state.auth_password.is_none();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("connection error from {}: {}", peer, err);
                break;
            }
        };

        let command = match parse_command(&line) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(reply)) => {
                if write_line(&mut writer, &reply).await.is_err() {
                    break;
                }
                continue;
            }
        };

        // Require authentication before anything else when enabled
        if !authenticated {
            match command {
                Command::Auth { password } => {
                    if state.auth_password.as_deref() == Some(password.as_str()) {
                        authenticated = true;
                        if write_line(&mut writer, "OK").await.is_err() {
                            break;
                        }
                    } else {
                        // Close the connection on failed auth
                        let _ = write_line(&mut writer, "ERROR: invalid password").await;
                        break;
                    }
                }
                _ => {
                    let reply = "ERROR: authentication required";
                    if write_line(&mut writer, reply).await.is_err() {
                        break;
                    }
                }
            }
            continue;
        }

        let reply = execute(&state, command);
        if write_line(&mut writer, &reply).await.is_err() {
            break;
        }
    }

    debug!("connection from {} closed", peer);
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}
