//! Seams for out-of-process collaborators.
//!
//! The chat core talks to three external services through traits so the
//! server can run self-contained with the bundled implementations and
//! swap in real backends without touching the routing path.

mod ledger;
mod profile;
mod reasoning;

pub use ledger::{LedgerService, LoggingLedger};
pub use profile::{InMemoryProfileStore, ProfileContext, ProfileStore};
pub use reasoning::{ReasoningOutcome, ReasoningService, TaxonomyReasoner};
