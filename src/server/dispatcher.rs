//! Dispatcher Module
//!
//! Bounded connection queue drained by a fixed pool of long-lived workers.
//!
//! The acceptor submits each inbound connection to the queue and suspends
//! while the queue is full (backpressure); connections are never dropped
//! and the queue never grows past its configured bound. Each worker owns
//! one connection at a time and drives it to completion before dequeuing
//! the next.

use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DEFAULT_WORKER_COUNT;

/// Capacity of the dispatch queue, fixed at construction.
pub const DISPATCH_QUEUE_CAPACITY: usize = 100;

// == Queue Depth ==
/// Shared gauge of the number of queued, not-yet-dispatched items.
///
/// A hook point for observability collaborators; the dispatcher embeds no
/// metric emission of its own. The gauge is updated around channel
/// operations, so a concurrent read may be off by one.
#[derive(Debug, Clone, Default)]
pub struct QueueDepth(Arc<AtomicI64>);

impl QueueDepth {
    /// Returns the current queue depth.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed).max(0) as usize
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    fn decrement(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

// == Dispatcher ==
/// Fans accepted connections out to a fixed set of worker tasks through a
/// bounded FIFO queue.
///
/// The pool size is fixed at startup and never grows or shrinks. Workers
/// hold no cache state of their own; whatever they need is captured by
/// the handler closure.
pub struct Dispatcher<T: Send + 'static> {
    queue: mpsc::Sender<T>,
    depth: QueueDepth,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> Dispatcher<T> {
    // == Constructor ==
    /// Spawns `worker_count` workers draining a queue of `queue_capacity`.
    ///
    /// A non-positive worker count falls back to the default (10). The
    /// `depth` gauge is shared so collaborators constructed before the
    /// dispatcher can sample it.
    ///
    /// # Arguments
    /// * `worker_count` - Number of worker tasks (default: 10 if zero)
    /// * `queue_capacity` - Bound of the pending-connection queue
    /// * `depth` - Shared queue depth gauge
    /// * `handler` - Invoked by a worker for each dequeued item
    pub fn new<H, Fut>(
        worker_count: usize,
        queue_capacity: usize,
        depth: QueueDepth,
        handler: H,
    ) -> Self
    where
        H: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let worker_count = if worker_count > 0 {
            worker_count
        } else {
            DEFAULT_WORKER_COUNT
        };

        let (tx, rx) = mpsc::channel(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..worker_count)
            .map(|id| {
                let rx = Arc::clone(&rx);
                let handler = handler.clone();
                let depth = depth.clone();

                tokio::spawn(async move {
                    debug!(worker = id, "worker started");
                    loop {
                        // The lock is held only for the dequeue, never
                        // while a connection is being served.
                        let item = { rx.lock().await.recv().await };
                        match item {
                            Some(item) => {
                                depth.decrement();
                                debug!(worker = id, "worker picked up a connection");
                                handler(item).await;
                            }
                            None => break,
                        }
                    }
                    debug!(worker = id, "worker exiting");
                })
            })
            .collect();

        Self {
            queue: tx,
            depth,
            workers,
        }
    }

    // == Submit ==
    /// Enqueues an item for the worker pool.
    ///
    /// Suspends the caller while the queue is at capacity. If the pool has
    /// already shut down the item is dropped with a warning; this only
    /// happens when the acceptor outlives the workers during shutdown.
    pub async fn submit(&self, item: T) {
        match self.queue.reserve().await {
            Ok(permit) => {
                self.depth.increment();
                permit.send(item);
            }
            Err(_) => warn!("dispatch queue closed, dropping connection"),
        }
    }

    // == Queue Depth ==
    /// Returns the number of items waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.depth.get()
    }

    // == Shutdown ==
    /// Closes the queue and waits for every worker to finish.
    ///
    /// Queued items are still drained; workers exit once the queue is
    /// empty and closed.
    pub async fn shutdown(self) {
        drop(self.queue);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}
