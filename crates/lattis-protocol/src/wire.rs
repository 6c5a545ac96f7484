//! Wire frames for the duplex (WebSocket) surface.
//!
//! Frames are tagged JSON objects. Server frames are wrapped in an
//! [`Envelope`] that carries delivery metadata (delivery timestamp,
//! queued-at marker) injected by the connection registry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentKind;

/// Feature flags advertised in the welcome frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    pub real_time_chat: bool,
    pub agent_communication: bool,
    pub live_updates: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            real_time_chat: true,
            agent_communication: true,
            live_updates: true,
        }
    }
}

/// A system notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    /// Notice category, e.g. "queued_messages".
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub message: String,
}

/// Frames sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Welcome frame sent on connect, enumerating capabilities.
    Connected {
        message: String,
        available_agents: Vec<AgentKind>,
        features: Features,
        user_id: String,
    },

    /// One per handled inbound chat frame.
    AgentResponse {
        agent: AgentKind,
        response: String,
        analysis: HashMap<String, Value>,
        actions: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Agent typing indicator.
    Typing { agent: AgentKind, active: bool },

    /// System notification (queued-message count, shutdown notices, ...).
    SystemNotification { notice: Notice },

    /// Error surfaced to the client. Degraded agent replies still arrive
    /// as `agent_response`; this is for malformed frames only.
    Error { message: String },

    /// Keepalive reply.
    Pong,
}

/// Frames sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Chat turn addressed to an agent.
    Chat {
        agent: AgentKind,
        message: String,
        #[serde(default)]
        conversation_id: Option<String>,
    },
    /// Keepalive.
    Ping,
}

/// A server frame plus delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub frame: ServerFrame,
    /// Injected when the frame is written to a live connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Set when the frame was parked in an offline queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<DateTime<Utc>>,
    /// Set on frames replayed from the offline queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_from_queue: Option<bool>,
    /// Set on frames fanned out to every connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<bool>,
}

impl Envelope {
    pub fn new(frame: ServerFrame) -> Self {
        Self {
            frame,
            timestamp: None,
            queued_at: None,
            delivered_from_queue: None,
            broadcast: None,
        }
    }
}

impl From<ServerFrame> for Envelope {
    fn from(frame: ServerFrame) -> Self {
        Envelope::new(frame)
    }
}
