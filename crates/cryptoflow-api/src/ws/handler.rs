//! WebSocket relay endpoint.
//!
//! `GET /ws/prices` upgrades the connection and streams every payload
//! the bridge pushes into the registry. The relay is one-way: client
//! frames are drained and ignored, only Close is honored.

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upgrade handler for `GET /ws/prices`.
pub async fn prices_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (client_id, mut rx) = state.clients.register().await;
    info!(client_id = %client_id, "relay client connected");

    let (mut sender, mut receiver) = socket.split();

    // Forward registry payloads to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Drain inbound frames; stop on Close or error.
    let receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "relay receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = receive_task => {}
    }

    state.clients.unregister(client_id).await;
    info!(client_id = %client_id, "relay client disconnected");
}
