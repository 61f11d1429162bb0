//! Shutdown coordination for the payment and authorization servers.
//!
//! `main` owns one [`Shutdown`] per process and triggers it from the signal
//! forwarder. Integration tests run both services off a single coordinator
//! and trigger it when their test stack is dropped.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Each [`crate::HttpServer::run`] subscribes before it starts accepting;
/// a single trigger makes every subscribed server stop accepting, drain its
/// in-flight requests and return. Triggering twice is harmless.
pub struct Shutdown {
    /// Broadcast channel sender; one slot is enough for a unit signal.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for one server's graceful-shutdown future.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscribed server. Without subscribers the signal is
    /// dropped, so subscribe before the server can be asked to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Servers still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
