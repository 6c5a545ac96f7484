//! Message and response types for agent conversations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Tag selecting which domain handler processes a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    CareerAdvisor,
    SkillsAnalyzer,
    NetworkConnector,
    OpportunityMatcher,
    ProfileAnalyzer,
}

impl AgentKind {
    /// All agent kinds, in the order they are advertised to clients.
    pub const ALL: [AgentKind; 5] = [
        AgentKind::CareerAdvisor,
        AgentKind::SkillsAnalyzer,
        AgentKind::NetworkConnector,
        AgentKind::OpportunityMatcher,
        AgentKind::ProfileAnalyzer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::CareerAdvisor => "career_advisor",
            AgentKind::SkillsAnalyzer => "skills_analyzer",
            AgentKind::NetworkConnector => "network_connector",
            AgentKind::OpportunityMatcher => "opportunity_matcher",
            AgentKind::ProfileAnalyzer => "profile_analyzer",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "career_advisor" => Ok(AgentKind::CareerAdvisor),
            "skills_analyzer" => Ok(AgentKind::SkillsAnalyzer),
            "network_connector" => Ok(AgentKind::NetworkConnector),
            "opportunity_matcher" => Ok(AgentKind::OpportunityMatcher),
            "profile_analyzer" => Ok(AgentKind::ProfileAnalyzer),
            other => Err(format!("unknown agent kind: {other}")),
        }
    }
}

/// What kind of content a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    FileUpload,
    SkillExtraction,
    CareerAnalysis,
    NetworkRecommendation,
    OpportunityMatch,
    ProfileUpdate,
    System,
}

/// A single inbound message in a conversation.
///
/// Immutable once appended to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Unique message ID.
    pub id: String,
    /// Owning conversation.
    pub conversation_id: String,
    /// Agent the sender addressed.
    pub agent: AgentKind,
    /// Sender identity ("user", "websocket", or an agent id for follow-ups).
    pub sender: String,
    #[serde(default)]
    pub kind: MessageKind,
    pub content: String,
    /// Free-form metadata supplied by the transport.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Attachment references (content-addressed hashes).
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
}

impl AgentMessage {
    /// Build a fresh text message addressed to `agent`.
    pub fn text(conversation_id: &str, agent: AgentKind, sender: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            agent,
            sender: sender.to_string(),
            kind: MessageKind::Text,
            content: content.to_string(),
            metadata: HashMap::new(),
            attachments: Vec::new(),
            created_at: Utc::now(),
            processed: false,
        }
    }
}

/// An external-update descriptor emitted by a handler.
///
/// Describes a change some out-of-process collaborator (the ledger) should
/// apply. The core only forwards these, it never blocks on confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerUpdate {
    /// Operation tag, e.g. "record_skill" or "update_profile_field".
    pub operation: String,
    /// Identity the update applies to.
    pub subject: String,
    /// Collaborator-defined payload.
    pub payload: Value,
}

/// The structured result of handling one message.
///
/// Created exactly once per handled [`AgentMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// ID of the message this responds to.
    pub message_id: String,
    /// Responding agent.
    pub agent: AgentKind,
    /// Human-readable reply.
    pub content: String,
    /// Opaque structured analysis defined by the agent's domain.
    #[serde(default)]
    pub analysis: HashMap<String, Value>,
    /// Recommended follow-up actions, in priority order.
    #[serde(default)]
    pub action_items: Vec<String>,
    /// Pending external updates for the ledger collaborator.
    #[serde(default)]
    pub ledger_updates: Vec<LedgerUpdate>,
    /// Confidence in the analysis, clamped to [0, 1].
    pub confidence: f64,
    /// Wall-clock processing time in seconds, never negative.
    pub processing_seconds: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_kind_round_trips_through_str() {
        for kind in AgentKind::ALL {
            let parsed: AgentKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn agent_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AgentKind::CareerAdvisor).unwrap();
        assert_eq!(json, "\"career_advisor\"");
    }

    #[test]
    fn unknown_agent_kind_is_rejected() {
        assert!("blockchain_oracle".parse::<AgentKind>().is_err());
    }

    #[test]
    fn text_message_defaults() {
        let msg = AgentMessage::text("c1", AgentKind::SkillsAnalyzer, "user", "hello");
        assert_eq!(msg.conversation_id, "c1");
        assert_eq!(msg.kind, MessageKind::Text);
        assert!(!msg.processed);
        assert!(msg.attachments.is_empty());
    }
}
