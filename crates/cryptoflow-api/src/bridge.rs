//! Redis to WebSocket bridge.
//!
//! Subscribes to the price channel and forwards each payload verbatim
//! to every registered relay client. The subscription reconnects with
//! a fixed delay; the relay keeps serving REST traffic meanwhile.

use crate::ws::ClientRegistry;
use cryptoflow_data::RedisBus;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Delay between subscription attempts after a failure.
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Run the bridge until cancelled.
pub async fn run(
    bus: RedisBus,
    channel: String,
    clients: Arc<ClientRegistry>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        match bus.get_pubsub().await {
            Ok(mut pubsub) => {
                if let Err(e) = pubsub.subscribe(&channel).await {
                    error!(channel = %channel, error = %e, "subscribe failed");
                } else {
                    info!(channel = %channel, "bridge subscribed");
                    forward(&mut pubsub, &clients, &cancel).await;
                }
            }
            Err(e) => {
                error!(error = %e, "pub/sub connection failed");
            }
        }

        if cancel.is_cancelled() {
            break;
        }

        warn!(
            delay_secs = RESUBSCRIBE_DELAY.as_secs(),
            "bridge resubscribing after delay"
        );
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
        }
    }

    info!("bridge stopped");
}

/// Forward messages from one subscription until it ends or the token
/// is cancelled.
async fn forward(
    pubsub: &mut redis::aio::PubSub,
    clients: &ClientRegistry,
    cancel: &CancellationToken,
) {
    let mut stream = pubsub.on_message();

    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = stream.next() => msg,
        };

        let Some(msg) = msg else {
            warn!("subscription stream ended");
            break;
        };

        match msg.get_payload::<String>() {
            Ok(payload) => {
                let delivered = clients.broadcast(&payload).await;
                debug!(delivered = delivered, "price update relayed");
            }
            Err(e) => {
                warn!(error = %e, "non-text payload dropped");
            }
        }
    }
}
