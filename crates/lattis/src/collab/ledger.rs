//! Ledger collaborator: durable record of profile-affecting updates.

use async_trait::async_trait;
use tracing::info;

use lattis_protocol::agent::LedgerUpdate;

/// Accepts handler-emitted updates for out-of-process application.
///
/// Submission is fire-and-forget from the chat path's point of view: the
/// caller spawns the submit and never blocks a reply on confirmation, so
/// implementations should be quick to accept and apply asynchronously.
#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn submit(&self, user_id: &str, update: &LedgerUpdate) -> anyhow::Result<()>;
}

/// Bundled implementation that records updates to the structured log.
#[derive(Default)]
pub struct LoggingLedger;

impl LoggingLedger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LedgerService for LoggingLedger {
    async fn submit(&self, user_id: &str, update: &LedgerUpdate) -> anyhow::Result<()> {
        info!(
            user_id,
            operation = %update.operation,
            subject = %update.subject,
            "ledger update accepted"
        );
        Ok(())
    }
}
