//! The chat turn: one inbound message through routing to a stored,
//! deliverable response. Shared by the HTTP and WebSocket transports.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lattis_protocol::agent::{AgentKind, AgentMessage, AgentResponse};

use crate::agents::HandlerContext;
use crate::api::error::ApiError;
use crate::api::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub agent: AgentKind,
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub session_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub agent_response: AgentResponse,
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of one chat turn, transport-agnostic.
pub struct ChatTurn {
    pub conversation_id: String,
    pub message_id: String,
    pub response: AgentResponse,
}

/// Run one chat turn: record the message, dispatch it, record the
/// response, and hand ledger updates off without blocking the reply.
pub async fn chat_turn(
    state: &AppState,
    user_id: &str,
    agent: AgentKind,
    text: &str,
    conversation_id: Option<&str>,
    session_type: &str,
) -> Result<ChatTurn, ApiError> {
    let (conversation_id, session) =
        state
            .store
            .get_or_create(conversation_id, user_id, session_type);
    let message = AgentMessage::text(&conversation_id, agent, user_id, text);
    let message_id = message.id.clone();
    state
        .store
        .append_message(&conversation_id, message.clone())
        .await?;
    state.registry.track_conversation(user_id, &conversation_id);

    let conversation_context = session.lock().await.context.clone();
    let profile = match state.profiles.context_for(user_id).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!(user_id, error = %err, "profile lookup failed, using empty context");
            Default::default()
        }
    };
    let ctx = HandlerContext {
        conversation: conversation_context,
        profile,
    };

    let response = state.router.dispatch(&message, &ctx).await.into_response();
    state
        .store
        .append_response(&conversation_id, response.clone())
        .await?;

    if !response.ledger_updates.is_empty() {
        let ledger = Arc::clone(&state.ledger);
        let updates = response.ledger_updates.clone();
        let user = user_id.to_string();
        // Fire-and-forget: the reply never waits on the ledger.
        tokio::spawn(async move {
            for update in updates {
                if let Err(err) = ledger.submit(&user, &update).await {
                    warn!(user_id = %user, error = %err, "ledger submission failed");
                }
            }
        });
    }

    Ok(ChatTurn {
        conversation_id,
        message_id,
        response,
    })
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }
    let session_type = req.session_type.as_deref().unwrap_or("chat");
    let turn = chat_turn(
        &state,
        &req.user_id,
        req.agent,
        &req.message,
        req.conversation_id.as_deref(),
        session_type,
    )
    .await?;
    Ok(Json(ChatResponse {
        conversation_id: turn.conversation_id,
        message_id: turn.message_id,
        timestamp: turn.response.created_at,
        agent_response: turn.response,
    }))
}
