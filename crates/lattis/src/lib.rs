//! Lattis backend library.
//!
//! Core components for the agent conversation routing service: the
//! connection registry, conversation store, agent router, and the HTTP
//! and WebSocket API surface that composes them.

pub mod agents;
pub mod api;
pub mod collab;
pub mod conversation;
pub mod registry;
