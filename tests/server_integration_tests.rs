//! Integration Tests for the TCP Server
//!
//! Spins up a real server on an ephemeral port and exercises the full
//! accept -> dispatch -> parse -> store -> reply cycle over TCP.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use shardcache::{serve, spawn_dispatcher, ServerState, ShardedStore, StoreOptions};

// == Helper Functions ==

async fn start_server(auth: Option<&str>) -> SocketAddr {
    let store = Arc::new(ShardedStore::new(StoreOptions {
        shard_count: 8,
        shard_capacity: 100,
    }));
    let state = ServerState::new(store, auth.map(String::from));
    let dispatcher = spawn_dispatcher(&state, 4);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, dispatcher, std::future::pending::<()>()));

    addr
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Sends one command line and reads one reply line.
    ///
    /// Returns None when the server closed the connection.
    async fn send(&mut self, line: &str) -> Option<String> {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();

        let mut reply = String::new();
        let read = self.reader.read_line(&mut reply).await.unwrap();
        if read == 0 {
            None
        } else {
            Some(reply.trim_end().to_string())
        }
    }
}

// == Basic Command Tests ==

#[tokio::test]
async fn test_set_and_get_roundtrip() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send("SET greeting hello").await.unwrap(), "OK");
    assert_eq!(client.send("GET greeting").await.unwrap(), "hello");
}

#[tokio::test]
async fn test_set_multiword_value() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send("SET msg hello wide world").await.unwrap(), "OK");
    assert_eq!(client.send("GET msg").await.unwrap(), "hello wide world");
}

#[tokio::test]
async fn test_get_missing_key() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.send("GET nothing").await.unwrap(),
        "ERROR: key not found"
    );
}

#[tokio::test]
async fn test_del_then_get() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send("SET doomed 42").await.unwrap(), "OK");
    assert_eq!(client.send("DEL doomed").await.unwrap(), "OK");
    assert_eq!(
        client.send("GET doomed").await.unwrap(),
        "ERROR: key not found"
    );

    // DEL again is still OK (idempotent)
    assert_eq!(client.send("DEL doomed").await.unwrap(), "OK");
}

#[tokio::test]
async fn test_overwrite_returns_latest_value() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    client.send("SET k v1").await.unwrap();
    client.send("SET k v2").await.unwrap();
    assert_eq!(client.send("GET k").await.unwrap(), "v2");
}

// == Protocol Error Tests ==

#[tokio::test]
async fn test_malformed_commands_keep_connection_open() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.send("SET lonely").await.unwrap(),
        "ERROR: SET requires key and value"
    );
    assert_eq!(client.send("GET").await.unwrap(), "ERROR: GET requires key");
    assert_eq!(client.send("DEL").await.unwrap(), "ERROR: DEL requires key");
    assert_eq!(
        client.send("FLUSH all").await.unwrap(),
        "ERROR: unknown command"
    );

    // The connection still works after every error
    assert_eq!(client.send("SET ok fine").await.unwrap(), "OK");
    assert_eq!(client.send("GET ok").await.unwrap(), "fine");
}

#[tokio::test]
async fn test_lowercase_verbs() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send("set key value").await.unwrap(), "OK");
    assert_eq!(client.send("get key").await.unwrap(), "value");
    assert_eq!(client.send("del key").await.unwrap(), "OK");
}

// == STATS Tests ==

#[tokio::test]
async fn test_stats_reports_counters() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    client.send("SET a 1").await.unwrap();
    client.send("GET a").await.unwrap();
    client.send("GET missing").await.unwrap();

    let reply = client.send("STATS").await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(json["sets"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["entries"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

// == AUTH Tests ==

#[tokio::test]
async fn test_auth_required_before_commands() {
    let addr = start_server(Some("sesame")).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.send("GET anything").await.unwrap(),
        "ERROR: authentication required"
    );

    assert_eq!(client.send("AUTH sesame").await.unwrap(), "OK");
    assert_eq!(client.send("SET k v").await.unwrap(), "OK");
    assert_eq!(client.send("GET k").await.unwrap(), "v");
}

#[tokio::test]
async fn test_auth_wrong_password_closes_connection() {
    let addr = start_server(Some("sesame")).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.send("AUTH wrong").await.unwrap(),
        "ERROR: invalid password"
    );

    // The server hangs up after a failed handshake
    let mut buf = String::new();
    let read = client.reader.read_line(&mut buf).await.unwrap();
    assert_eq!(read, 0, "expected EOF after failed auth");
}

#[tokio::test]
async fn test_no_auth_needed_when_disabled() {
    let addr = start_server(None).await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.send("SET k v").await.unwrap(), "OK");
}

// == Concurrency Tests ==

#[tokio::test]
async fn test_concurrent_clients_isolated_keys() {
    let addr = start_server(None).await;

    let mut tasks = Vec::new();
    for c in 0..8 {
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await;
            for i in 0..20 {
                let key = format!("c{}-k{}", c, i);
                assert_eq!(
                    client.send(&format!("SET {} v{}", key, i)).await.unwrap(),
                    "OK"
                );
                assert_eq!(
                    client.send(&format!("GET {}", key)).await.unwrap(),
                    format!("v{}", i)
                );
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_more_clients_than_workers() {
    // The pool has 4 workers; 12 short-lived connections must all be served
    let addr = start_server(None).await;

    let mut tasks = Vec::new();
    for c in 0..12 {
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(addr).await;
            let key = format!("burst-{}", c);
            assert_eq!(
                client.send(&format!("SET {} done", key)).await.unwrap(),
                "OK"
            );
            assert_eq!(client.send(&format!("GET {}", key)).await.unwrap(), "done");
            // Dropping the client closes the connection and frees the worker
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}
