//! WebSocket endpoint for the real-time change feed.
//!
//! Per-connection lifecycle: Connecting (HTTP upgrade) -> Open (after the
//! `connected` acknowledgement) -> Closed. Closed is terminal; reconnecting
//! clients start a brand-new connection with no replay of missed events.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast::error::RecvError;

use crate::events::EventBroadcaster;
use crate::state::AppState;

pub async fn events_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.events.clone()))
}

async fn handle_socket(mut socket: WebSocket, events: EventBroadcaster) {
    // Subscribing registers this connection; dropping the receiver on any
    // exit path below prunes it again.
    let mut feed = events.subscribe();

    let hello =
        serde_json::json!({ "type": "connected", "message": "real-time updates enabled" });
    if socket.send(Message::Text(hello.to_string().into())).await.is_err() {
        return;
    }

    tracing::debug!(
        connections = events.connection_count(),
        "real-time listener connected"
    );

    loop {
        tokio::select! {
            event = feed.recv() => match event {
                Ok(event) => {
                    let Ok(payload) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        // Half-closed transport; detected on send, not retried.
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Best-effort delivery: a slow listener loses events and
                    // is expected to re-fetch through the read endpoints.
                    tracing::debug!(skipped, "listener lagged behind the event feed");
                }
                Err(RecvError::Closed) => break,
            },
            message = socket.recv() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(inbound)) => {
                    // Client messages are accepted but unused.
                    tracing::debug!(?inbound, "ignoring inbound client message");
                }
            },
        }
    }

    tracing::debug!("real-time listener disconnected");
}
