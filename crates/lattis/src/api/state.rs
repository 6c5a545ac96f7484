//! Shared application state handed to every route.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::agents::handlers::default_handlers;
use crate::agents::AgentRouter;
use crate::collab::{InMemoryProfileStore, LedgerService, LoggingLedger, ProfileStore, TaxonomyReasoner};
use crate::conversation::ConversationStore;
use crate::registry::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub store: Arc<ConversationStore>,
    pub router: Arc<AgentRouter>,
    pub profiles: Arc<dyn ProfileStore>,
    pub ledger: Arc<dyn LedgerService>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Compose the state with the bundled collaborators.
    pub fn new(handler_timeout: Duration, flush_delay: Duration) -> Self {
        let reasoner = Arc::new(TaxonomyReasoner::new());
        let mut router = AgentRouter::new(handler_timeout);
        for handler in default_handlers(reasoner) {
            router.register(handler);
        }
        Self {
            registry: Arc::new(ConnectionRegistry::new(flush_delay)),
            store: Arc::new(ConversationStore::new()),
            router: Arc::new(router),
            profiles: Arc::new(InMemoryProfileStore::new()),
            ledger: Arc::new(LoggingLedger::new()),
            started_at: Utc::now(),
        }
    }
}
