//! The handler seam between routing and agent domain logic.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use lattis_protocol::agent::{AgentKind, AgentMessage, LedgerUpdate};

use crate::collab::ProfileContext;

/// Everything a handler may consult besides the message itself.
#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    /// Shared context accumulated on the conversation session.
    pub conversation: HashMap<String, Value>,
    /// The sender's professional profile, empty when none is stored.
    pub profile: ProfileContext,
}

/// Raw handler result before response shaping.
///
/// Values here are unvalidated; the aggregator clamps them into the
/// invariants [`lattis_protocol::agent::AgentResponse`] documents.
#[derive(Debug, Clone, Default)]
pub struct HandlerOutput {
    pub reply: String,
    pub analysis: HashMap<String, Value>,
    pub action_items: Vec<String>,
    pub ledger_updates: Vec<LedgerUpdate>,
    pub confidence: f64,
}

/// One domain agent.
///
/// Handlers are pure with respect to server state: they read the message
/// and context, and return an output. Side effects travel as
/// [`LedgerUpdate`]s applied by collaborators after the fact.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Capability tags advertised on the agent listing endpoint.
    fn capabilities(&self) -> &'static [&'static str];

    async fn handle(
        &self,
        message: &AgentMessage,
        ctx: &HandlerContext,
    ) -> anyhow::Result<HandlerOutput>;
}
