//! Conversation store: session lifecycle and message/response history.
//!
//! Sessions live behind per-conversation async mutexes so concurrent
//! appends to different conversations never contend, while appends to
//! the same conversation serialize.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use lattis_protocol::agent::{AgentKind, AgentMessage, AgentResponse};
use lattis_protocol::conversation::ConversationSession;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),
    #[error("message {message_id} does not exist in conversation {conversation_id}")]
    UnknownMessage {
        message_id: String,
        conversation_id: String,
    },
    #[error("message {message_id} belongs to conversation {actual}, not {expected}")]
    ConversationMismatch {
        message_id: String,
        expected: String,
        actual: String,
    },
}

/// In-memory conversation store keyed by conversation id.
#[derive(Default)]
pub struct ConversationStore {
    sessions: DashMap<String, Arc<Mutex<ConversationSession>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an existing session handle, or create one for `user_id` when
    /// `conversation_id` is absent or unknown. Returns the id alongside
    /// the handle since creation may mint a fresh one.
    pub fn get_or_create(
        &self,
        conversation_id: Option<&str>,
        user_id: &str,
        session_type: &str,
    ) -> (String, Arc<Mutex<ConversationSession>>) {
        if let Some(id) = conversation_id
            && let Some(existing) = self.sessions.get(id)
        {
            return (id.to_string(), Arc::clone(existing.value()));
        }
        let id = conversation_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = Arc::new(Mutex::new(ConversationSession::new(
            &id,
            user_id,
            session_type,
        )));
        self.sessions.insert(id.clone(), Arc::clone(&session));
        debug!(conversation_id = %id, user_id, "conversation created");
        (id, session)
    }

    pub fn get(&self, conversation_id: &str) -> Option<Arc<Mutex<ConversationSession>>> {
        self.sessions
            .get(conversation_id)
            .map(|e| Arc::clone(e.value()))
    }

    /// Append a user message, marking the agent as engaged and bumping
    /// activity. The message's own conversation id must match.
    pub async fn append_message(
        &self,
        conversation_id: &str,
        message: AgentMessage,
    ) -> Result<(), StoreError> {
        if message.conversation_id != conversation_id {
            return Err(StoreError::ConversationMismatch {
                message_id: message.id.clone(),
                expected: conversation_id.to_string(),
                actual: message.conversation_id.clone(),
            });
        }
        let session = self
            .get(conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(conversation_id.to_string()))?;
        session.lock().await.push_message(message);
        Ok(())
    }

    /// Append an agent response. The response must reference a message
    /// already recorded in this conversation.
    pub async fn append_response(
        &self,
        conversation_id: &str,
        response: AgentResponse,
    ) -> Result<(), StoreError> {
        let session = self
            .get(conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(conversation_id.to_string()))?;
        let mut session = session.lock().await;
        if !session.contains_message(&response.message_id) {
            return Err(StoreError::UnknownMessage {
                message_id: response.message_id.clone(),
                conversation_id: conversation_id.to_string(),
            });
        }
        session.push_response(response);
        Ok(())
    }

    pub async fn messages_by_agent(
        &self,
        conversation_id: &str,
        agent: AgentKind,
    ) -> Result<Vec<AgentMessage>, StoreError> {
        let session = self
            .get(conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(conversation_id.to_string()))?;
        let session = session.lock().await;
        Ok(session
            .messages_by_agent(agent)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn latest_message(
        &self,
        conversation_id: &str,
    ) -> Result<Option<AgentMessage>, StoreError> {
        let session = self
            .get(conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(conversation_id.to_string()))?;
        let session = session.lock().await;
        Ok(session.latest_message().cloned())
    }

    /// Point-in-time copy of a session for read endpoints.
    pub async fn snapshot(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSession, StoreError> {
        let session = self
            .get(conversation_id)
            .ok_or_else(|| StoreError::UnknownConversation(conversation_id.to_string()))?;
        let session = session.lock().await;
        Ok(session.clone())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(conversation_id: &str, agent: AgentKind, content: &str) -> AgentMessage {
        AgentMessage::text(conversation_id, agent, "u1", content)
    }

    fn response_to(message: &AgentMessage, content: &str) -> AgentResponse {
        AgentResponse {
            message_id: message.id.clone(),
            agent: message.agent,
            content: content.to_string(),
            analysis: Default::default(),
            action_items: Vec::new(),
            ledger_updates: Vec::new(),
            confidence: 0.9,
            processing_seconds: 0.1,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_or_create_reuses_existing_session() {
        let store = ConversationStore::new();
        let (id, _) = store.get_or_create(None, "u1", "career_guidance");
        let (again, _) = store.get_or_create(Some(&id), "u1", "career_guidance");
        assert_eq!(id, again);
        assert_eq!(store.active_count(), 1);
    }

    #[tokio::test]
    async fn unknown_conversation_id_creates_fresh_session() {
        let store = ConversationStore::new();
        let (id, _) = store.get_or_create(Some("never-seen"), "u1", "chat");
        assert_eq!(id, "never-seen");
        assert_eq!(store.active_count(), 1);
    }

    #[tokio::test]
    async fn append_message_engages_agent() {
        let store = ConversationStore::new();
        let (id, session) = store.get_or_create(None, "u1", "chat");
        store
            .append_message(&id, text(&id, AgentKind::CareerAdvisor, "hello"))
            .await
            .unwrap();

        let session = session.lock().await;
        assert_eq!(session.messages.len(), 1);
        assert!(session.engaged_agents.contains(&AgentKind::CareerAdvisor));
    }

    #[tokio::test]
    async fn append_message_rejects_mismatched_conversation() {
        let store = ConversationStore::new();
        let (id, _) = store.get_or_create(None, "u1", "chat");
        let err = store
            .append_message(&id, text("some-other-id", AgentKind::CareerAdvisor, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConversationMismatch { .. }));
    }

    #[tokio::test]
    async fn append_response_requires_known_message() {
        let store = ConversationStore::new();
        let (id, _) = store.get_or_create(None, "u1", "chat");
        let msg = text(&id, AgentKind::SkillsAnalyzer, "audit my skills");

        let orphan = response_to(&msg, "never recorded");
        let err = store.append_response(&id, orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownMessage { .. }));

        store.append_message(&id, msg.clone()).await.unwrap();
        store
            .append_response(&id, response_to(&msg, "here is your audit"))
            .await
            .unwrap();
        let snapshot = store.snapshot(&id).await.unwrap();
        assert_eq!(snapshot.responses.len(), 1);
    }

    #[tokio::test]
    async fn messages_by_agent_filters() {
        let store = ConversationStore::new();
        let (id, _) = store.get_or_create(None, "u1", "chat");
        store
            .append_message(&id, text(&id, AgentKind::CareerAdvisor, "a"))
            .await
            .unwrap();
        store
            .append_message(&id, text(&id, AgentKind::SkillsAnalyzer, "b"))
            .await
            .unwrap();
        store
            .append_message(&id, text(&id, AgentKind::CareerAdvisor, "c"))
            .await
            .unwrap();

        let advisor = store
            .messages_by_agent(&id, AgentKind::CareerAdvisor)
            .await
            .unwrap();
        assert_eq!(advisor.len(), 2);
        let latest = store.latest_message(&id).await.unwrap().unwrap();
        assert_eq!(latest.content, "c");
    }

    #[tokio::test]
    async fn operations_on_missing_conversation_error() {
        let store = ConversationStore::new();
        assert!(matches!(
            store.snapshot("missing").await.unwrap_err(),
            StoreError::UnknownConversation(_)
        ));
    }
}
