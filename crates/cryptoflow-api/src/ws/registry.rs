//! Connected WebSocket client registry.
//!
//! Each client owns a bounded mpsc channel. Broadcast walks a snapshot
//! of the senders and uses `try_send`, so one stalled client drops its
//! own messages without blocking delivery to anyone else. Closed
//! channels are pruned on the next broadcast.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-client outbound buffer; beyond this, messages are dropped for
/// that client only.
pub const CLIENT_BUFFER: usize = 64;

/// Registry of connected relay clients.
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<Uuid, mpsc::Sender<String>>>,
}

impl ClientRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new client; the receiver feeds its send task.
    pub async fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);

        self.clients.write().await.insert(id, tx);
        debug!(client_id = %id, "client registered");

        (id, rx)
    }

    /// Remove a client. Safe to call twice.
    pub async fn unregister(&self, id: Uuid) {
        if self.clients.write().await.remove(&id).is_some() {
            debug!(client_id = %id, "client unregistered");
        }
    }

    /// Number of connected clients.
    pub async fn count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Deliver a payload to every client. Returns the number of
    /// clients that accepted it.
    pub async fn broadcast(&self, payload: &str) -> usize {
        let snapshot: Vec<(Uuid, mpsc::Sender<String>)> = {
            let clients = self.clients.read().await;
            clients.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut delivered = 0;
        let mut closed: Vec<Uuid> = Vec::new();

        for (id, tx) in snapshot {
            match tx.try_send(payload.to_string()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(client_id = %id, "client buffer full, update dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed.push(id);
                }
            }
        }

        if !closed.is_empty() {
            let mut clients = self.clients.write().await;
            for id in closed {
                clients.remove(&id);
                debug!(client_id = %id, "closed client pruned");
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_and_unregister() {
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.register().await;
        assert_eq!(registry.count().await, 1);

        registry.unregister(id).await;
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_client() {
        let registry = ClientRegistry::new();
        let (_a, mut rx_a) = registry.register().await;
        let (_b, mut rx_b) = registry.register().await;

        let delivered = registry.broadcast("tick").await;
        assert_eq!(delivered, 2);
        assert_eq!(rx_a.recv().await.unwrap(), "tick");
        assert_eq!(rx_b.recv().await.unwrap(), "tick");
    }

    #[tokio::test]
    async fn stalled_client_does_not_block_others() {
        let registry = ClientRegistry::new();
        let (_stalled, _rx_stalled) = registry.register().await;
        let (_live, mut rx_live) = registry.register().await;

        // Fill the stalled client's buffer; it never reads.
        for i in 0..=CLIENT_BUFFER {
            registry.broadcast(&format!("tick-{}", i)).await;
        }

        // The live client saw everything up to its own buffer size.
        assert_eq!(rx_live.recv().await.unwrap(), "tick-0");
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_broadcast() {
        let registry = ClientRegistry::new();
        let (_gone, rx) = registry.register().await;
        drop(rx);

        let delivered = registry.broadcast("tick").await;
        assert_eq!(delivered, 0);
        assert_eq!(registry.count().await, 0);
    }
}
