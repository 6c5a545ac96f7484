//! The transport seam between the registry and a live connection.

use async_trait::async_trait;
use thiserror::Error;

/// A write to a live connection failed.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("connection closed")]
    Closed,
    #[error("transport error: {0}")]
    Transport(String),
}

/// One direction of a duplex connection: server -> client.
///
/// The registry only ever hands a sink serialized frame text; framing and
/// timestamp injection happen before this boundary. Implemented by the
/// WebSocket surface in production and by in-memory doubles in tests.
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Write one serialized frame.
    async fn send(&self, text: String) -> Result<(), SinkError>;

    /// Gracefully close the connection. Close failures are the caller's
    /// problem to ignore; disconnection bookkeeping must proceed anyway.
    async fn close(&self) -> Result<(), SinkError>;
}
