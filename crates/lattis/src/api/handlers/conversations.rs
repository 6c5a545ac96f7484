//! Conversation read endpoints.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use lattis_protocol::conversation::ConversationSession;

use crate::api::error::ApiError;
use crate::api::state::AppState;

#[derive(Serialize)]
pub struct ConversationView {
    #[serde(flatten)]
    pub session: ConversationSession,
    /// Message counts keyed by agent kind.
    pub agent_message_counts: HashMap<String, usize>,
}

/// GET /conversations/{conversation_id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let session = state.store.snapshot(&conversation_id).await?;
    let mut agent_message_counts: HashMap<String, usize> = HashMap::new();
    for message in &session.messages {
        *agent_message_counts
            .entry(message.agent.to_string())
            .or_default() += 1;
    }
    Ok(Json(ConversationView {
        session,
        agent_message_counts,
    }))
}
