//! WebSocket push channel for live counter snapshots.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use orderline_core::{subscriber_channel, CounterSnapshot};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Messages pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The counter changed (or the client just connected / asked).
    #[serde(rename_all = "camelCase")]
    CountUpdate {
        completed_count: u64,
        queued_count: u64,
        timestamp: DateTime<Utc>,
    },
    /// Liveness acknowledgement.
    Pong { timestamp: DateTime<Utc> },
}

impl ServerMessage {
    fn message_type(&self) -> &'static str {
        match self {
            ServerMessage::CountUpdate { .. } => "count_update",
            ServerMessage::Pong { .. } => "pong",
        }
    }
}

impl From<CounterSnapshot> for ServerMessage {
    fn from(snapshot: CounterSnapshot) -> Self {
        ServerMessage::CountUpdate {
            completed_count: snapshot.completed_count,
            queued_count: snapshot.queued_count,
            timestamp: snapshot.timestamp,
        }
    }
}

/// Control messages accepted from WebSocket clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    GetCount,
    Ping,
}

/// WebSocket upgrade handler.
pub async fn counter_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let Some(counter) = state.counter() else {
        warn!("WebSocket client connected but no counter is registered");
        return;
    };

    let (mut sender, mut receiver) = socket.split();

    // Subscribe to the actor; it pushes the current snapshot immediately.
    let (sink, mut updates) = subscriber_channel();
    if counter.subscribe(sink).await.is_err() {
        warn!("Counter actor unavailable, closing WebSocket");
        return;
    }

    // Channel for direct replies (get_count, ping) so they share the socket
    // with broadcast updates.
    let (reply_tx, mut replies) = mpsc::channel::<ServerMessage>(8);

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("Counter subscriber connected");

    // Forward actor pushes and direct replies to this client.
    let send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                snapshot = updates.recv() => match snapshot {
                    Some(snapshot) => ServerMessage::from(snapshot),
                    None => break,
                },
                reply = replies.recv() => match reply {
                    Some(message) => message,
                    None => break,
                },
            };

            WS_MESSAGES_SENT
                .with_label_values(&[message.message_type()])
                .inc();

            match serde_json::to_string(&message) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, client disconnected");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize counter message: {}", e);
                }
            }
        }
    });

    // Handle incoming control messages from the client.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::GetCount) => match counter.get().await {
                    Ok(snapshot) => {
                        let _ = reply_tx.send(ServerMessage::from(snapshot)).await;
                    }
                    Err(e) => warn!("Counter lookup for WebSocket client failed: {}", e),
                },
                Ok(ClientMessage::Ping) => {
                    let _ = reply_tx
                        .send(ServerMessage::Pong {
                            timestamp: Utc::now(),
                        })
                        .await;
                }
                Err(_) => {
                    // Unrecognized types are logged and otherwise ignored.
                    debug!("Ignoring unrecognized WebSocket message: {}", text);
                }
            },
            Ok(_) => {
                // Ignore other message types
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up; dropping our receiver makes the actor prune this subscriber
    // on its next broadcast.
    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("Counter subscriber disconnected");
}
