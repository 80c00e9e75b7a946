//! Server Module
//!
//! TCP accept loop, shared handler state, and the worker-pool dispatcher
//! feeding connections into the store.

mod connection;
mod dispatcher;

pub use connection::handle_connection;
pub use dispatcher::{Dispatcher, QueueDepth, DISPATCH_QUEUE_CAPACITY};

use std::future::Future;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::cache::{ShardedStore, StoreOptions};
use crate::config::Config;

// == Server State ==
/// State shared by every connection handler.
///
/// The store is the only resource shared across workers; it is referenced,
/// never copied, and all mutation goes through its shard-local locks.
#[derive(Clone)]
pub struct ServerState {
    /// The one shared sharded store
    pub store: Arc<ShardedStore>,
    /// Password required by the AUTH handshake; None disables auth
    pub auth_password: Option<String>,
    /// Dispatch queue depth gauge, sampled by the STATS command
    pub queue_depth: QueueDepth,
}

impl ServerState {
    /// Creates a new ServerState around an existing store.
    pub fn new(store: Arc<ShardedStore>, auth_password: Option<String>) -> Self {
        Self {
            store,
            auth_password,
            queue_depth: QueueDepth::default(),
        }
    }

    /// Creates a new ServerState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = ShardedStore::new(StoreOptions {
            shard_count: config.shard_count,
            shard_capacity: config.shard_capacity,
        });
        Self::new(Arc::new(store), config.auth_password.clone())
    }
}

// == Dispatcher Wiring ==
/// Spawns the worker pool, wiring each worker to the connection handler.
///
/// The dispatcher shares the state's queue depth gauge so STATS replies
/// can report it.
pub fn spawn_dispatcher(state: &ServerState, worker_count: usize) -> Dispatcher<TcpStream> {
    let depth = state.queue_depth.clone();
    let state = state.clone();

    Dispatcher::new(
        worker_count,
        DISPATCH_QUEUE_CAPACITY,
        depth,
        move |stream: TcpStream| {
            let state = state.clone();
            async move { handle_connection(stream, state).await }
        },
    )
}

// == Accept Loop ==
/// Accepts inbound connections and submits them to the worker pool until
/// the shutdown future resolves, then drains the pool.
///
/// A full dispatch queue suspends this loop (backpressure) rather than
/// dropping connections.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Dispatcher<TcpStream>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("accepted connection from {}", peer);
                    dispatcher.submit(stream).await;
                }
                Err(err) => warn!("failed to accept connection: {}", err),
            },
            _ = &mut shutdown => {
                info!("shutdown signal received, draining worker pool");
                break;
            }
        }
    }

    dispatcher.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_config() {
        let config = Config {
            shard_count: 4,
            shard_capacity: 8,
            auth_password: Some("secret".to_string()),
            ..Config::default()
        };

        let state = ServerState::from_config(&config);
        assert_eq!(state.store.shard_count(), 4);
        assert_eq!(state.auth_password.as_deref(), Some("secret"));
        assert_eq!(state.queue_depth.get(), 0);
    }

    #[test]
    fn test_state_from_config_invalid_values_use_defaults() {
        let config = Config {
            shard_count: 0,
            shard_capacity: 0,
            ..Config::default()
        };

        let state = ServerState::from_config(&config);
        assert_eq!(state.store.shard_count(), 16);
    }
}
