//! WebSocket transport: one socket per user identity, bridged onto the
//! connection registry through a channel-backed sink.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use lattis_protocol::wire::{ClientFrame, ServerFrame};

use crate::agents::response;
use crate::api::handlers::chat::chat_turn;
use crate::api::state::AppState;
use crate::registry::{ConnectionSink, SinkError};

/// Outbound channel depth per socket. Overflow means the peer stopped
/// draining; the send fails and the registry treats it as a disconnect.
const OUTBOUND_BUFFER: usize = 64;

/// GET /ws/{user_id}
pub async fn ws_upgrade(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, user_id, socket))
}

/// Registry-facing sink writing into the socket's outbound channel.
struct WsSink {
    tx: mpsc::Sender<Message>,
}

#[async_trait]
impl ConnectionSink for WsSink {
    async fn send(&self, text: String) -> Result<(), SinkError> {
        self.tx
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| SinkError::Closed)
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.tx
            .send(Message::Close(None))
            .await
            .map_err(|_| SinkError::Closed)
    }
}

async fn handle_socket(state: AppState, user_id: String, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if ws_tx.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let sink = Arc::new(WsSink { tx });
    let generation = match state.registry.connect(&user_id, sink).await {
        Ok(generation) => generation,
        Err(err) => {
            warn!(user_id, error = %err, "websocket handshake failed");
            writer.abort();
            return;
        }
    };

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                state.registry.note_received(&user_id);
                handle_frame(&state, &user_id, text.as_str()).await;
            }
            Message::Close(_) => break,
            // Pings and pongs are handled by the protocol layer.
            _ => {}
        }
    }

    // Scoped to this connection so a reconnect that raced ahead of this
    // socket's teardown keeps its own registration.
    state.registry.disconnect_generation(&user_id, generation);
    debug!(user_id, "websocket loop ended");
}

async fn handle_frame(state: &AppState, user_id: &str, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(err) => {
            debug!(user_id, error = %err, "malformed client frame");
            state
                .registry
                .send(
                    user_id,
                    ServerFrame::Error {
                        message: format!("malformed frame: {err}"),
                    }
                    .into(),
                )
                .await;
            return;
        }
    };

    match frame {
        ClientFrame::Ping => {
            state.registry.send(user_id, ServerFrame::Pong.into()).await;
        }
        ClientFrame::Chat {
            agent,
            message,
            conversation_id,
        } => {
            state.registry.send_typing(user_id, agent, true).await;
            let turn = chat_turn(
                state,
                user_id,
                agent,
                &message,
                conversation_id.as_deref(),
                "websocket",
            )
            .await;
            state.registry.send_typing(user_id, agent, false).await;

            match turn {
                Ok(turn) => {
                    state
                        .registry
                        .send(user_id, response::to_frame(&turn.response).into())
                        .await;
                }
                Err(err) => {
                    state
                        .registry
                        .send(
                            user_id,
                            ServerFrame::Error {
                                message: err.to_string(),
                            }
                            .into(),
                        )
                        .await;
                }
            }
        }
    }
}
