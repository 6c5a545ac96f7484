//! Conversation session state.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::{AgentKind, AgentMessage, AgentResponse};

/// Lifecycle state of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Error,
}

/// A conversation with one or more agents.
///
/// Mutated only through the append operations; `last_activity` is
/// monotonically non-decreasing. Multiple responses per message are
/// possible when several agents engage, so the response list is not
/// index-aligned with the message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub user_id: String,
    pub session_type: String,
    #[serde(default)]
    pub status: ConversationStatus,
    #[serde(default)]
    pub engaged_agents: HashSet<AgentKind>,
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
    #[serde(default)]
    pub responses: Vec<AgentResponse>,
    /// Shared conversation context handed to handlers.
    #[serde(default)]
    pub context: HashMap<String, Value>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Cumulative session duration in minutes.
    #[serde(default)]
    pub duration_minutes: i64,
}

impl ConversationSession {
    pub fn new(id: &str, user_id: &str, session_type: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            session_type: session_type.to_string(),
            status: ConversationStatus::Active,
            engaged_agents: HashSet::new(),
            messages: Vec::new(),
            responses: Vec::new(),
            context: HashMap::new(),
            goals: Vec::new(),
            achievements: Vec::new(),
            created_at: now,
            last_activity: now,
            duration_minutes: 0,
        }
    }

    /// Append a message and advance activity bookkeeping.
    pub fn push_message(&mut self, message: AgentMessage) {
        self.engaged_agents.insert(message.agent);
        self.messages.push(message);
        self.touch();
    }

    /// Append a response and advance activity bookkeeping.
    pub fn push_response(&mut self, response: AgentResponse) {
        self.responses.push(response);
        self.touch();
    }

    /// Messages addressed to a specific agent, in append order.
    pub fn messages_by_agent(&self, agent: AgentKind) -> Vec<&AgentMessage> {
        self.messages.iter().filter(|m| m.agent == agent).collect()
    }

    /// The most recently appended message, if any.
    pub fn latest_message(&self) -> Option<&AgentMessage> {
        self.messages.last()
    }

    /// Whether a message with this ID has been appended.
    pub fn contains_message(&self, message_id: &str) -> bool {
        self.messages.iter().any(|m| m.id == message_id)
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // Clock adjustments must not move activity backwards.
        if now > self.last_activity {
            self.last_activity = now;
        }
        self.duration_minutes = (self.last_activity - self.created_at).num_minutes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentKind;

    #[test]
    fn new_session_starts_active_and_empty() {
        let s = ConversationSession::new("c1", "u1", "chat");
        assert_eq!(s.status, ConversationStatus::Active);
        assert!(s.messages.is_empty());
        assert!(s.responses.is_empty());
        assert!(s.latest_message().is_none());
    }

    #[test]
    fn push_message_tracks_engaged_agents_and_activity() {
        let mut s = ConversationSession::new("c1", "u1", "chat");
        let before = s.last_activity;
        s.push_message(AgentMessage::text("c1", AgentKind::CareerAdvisor, "user", "hi"));
        assert!(s.engaged_agents.contains(&AgentKind::CareerAdvisor));
        assert!(s.last_activity >= before);
        assert_eq!(s.latest_message().unwrap().content, "hi");
    }

    #[test]
    fn messages_by_agent_filters_in_order() {
        let mut s = ConversationSession::new("c1", "u1", "chat");
        s.push_message(AgentMessage::text("c1", AgentKind::CareerAdvisor, "user", "a"));
        s.push_message(AgentMessage::text("c1", AgentKind::SkillsAnalyzer, "user", "b"));
        s.push_message(AgentMessage::text("c1", AgentKind::CareerAdvisor, "user", "c"));

        let advisor: Vec<_> = s
            .messages_by_agent(AgentKind::CareerAdvisor)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(advisor, ["a", "c"]);
    }
}
