//! Canonical protocol types for Lattis agent conversations.
//!
//! Shared between the server and any client that speaks the duplex
//! protocol. Wire-level frames live in [`wire`]; domain types (messages,
//! responses, sessions) live in [`agent`] and [`conversation`].

pub mod agent;
pub mod conversation;
pub mod wire;

pub use agent::{AgentKind, AgentMessage, AgentResponse, LedgerUpdate, MessageKind};
pub use conversation::{ConversationSession, ConversationStatus};
pub use wire::{ClientFrame, Notice, ServerFrame};
