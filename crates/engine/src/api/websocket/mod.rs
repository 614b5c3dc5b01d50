//! WebSocket handling for Player connections.
//!
//! Each socket gets a writer task fed by a bounded channel; the read loop
//! parses frames and hands them to the relay one at a time, so messages from
//! one sender are dispatched in order.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use worldcast_domain::ConnectionId;
use worldcast_shared::ClientMessage;

use super::connections::Outbound;
use crate::app::App;
use crate::use_cases::Relay;

/// Buffer size for per-connection message channels.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// How long a dropped connection's writer gets to flush a queued close frame.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(app): State<Arc<App>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, app: Arc<App>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let relay = app.relay.clone();

    let (tx, mut rx) = mpsc::channel::<Outbound>(CONNECTION_CHANNEL_BUFFER);
    let (connection_id, shutdown) = relay.connect(tx).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Forward queued frames to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let sent = match frame {
                Outbound::Message(msg) => match serde_json::to_string(&msg) {
                    Ok(json) => ws_sender.send(Message::Text(json.into())).await,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to serialize server message");
                        continue;
                    }
                },
                Outbound::Ping => ws_sender.send(Message::Ping(Bytes::new())).await,
                Outbound::Close => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            };
            if sent.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            _ = shutdown.cancelled() => {
                tracing::debug!(connection_id = %connection_id, "Connection dropped by relay");
                let _ = tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await;
                break;
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    dispatch_frame(&relay, connection_id, text.as_str()).await;
                }
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => dispatch_frame(&relay, connection_id, text).await,
                    Err(_) => {
                        tracing::debug!(connection_id = %connection_id, "Dropping non-UTF-8 binary frame");
                    }
                },
                Some(Ok(Message::Pong(_))) => relay.pong(connection_id).await,
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            },
        }
    }

    // Clean up
    relay.disconnect(connection_id).await;
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Parse one frame. Malformed input is dropped and the connection stays open.
pub(crate) fn parse_client_message(text: &str) -> Option<ClientMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Unknown) => None,
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::debug!(error = %e, "Dropping unparseable message");
            None
        }
    }
}

async fn dispatch_frame(relay: &Relay, connection_id: ConnectionId, text: &str) {
    if let Some(msg) = parse_client_message(text) {
        relay.handle(connection_id, msg).await;
    }
}

// =============================================================================
// WebSocket Integration Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support;
