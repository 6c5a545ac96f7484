//! Bundled domain handlers, one per [`AgentKind`].

use std::sync::Arc;

use lattis_protocol::agent::AgentKind;

use crate::collab::ReasoningService;

use super::handler::AgentHandler;

mod career;
mod network;
mod opportunity;
mod profile;
mod skills;

pub use career::CareerAdvisor;
pub use network::NetworkConnector;
pub use opportunity::OpportunityMatcher;
pub use profile::ProfileAnalyzer;
pub use skills::SkillsAnalyzer;

/// One handler for every advertised agent kind, sharing one reasoner.
pub fn default_handlers(reasoner: Arc<dyn ReasoningService>) -> Vec<Arc<dyn AgentHandler>> {
    vec![
        Arc::new(CareerAdvisor::new(Arc::clone(&reasoner))),
        Arc::new(SkillsAnalyzer::new(Arc::clone(&reasoner))),
        Arc::new(NetworkConnector::new(Arc::clone(&reasoner))),
        Arc::new(OpportunityMatcher::new(Arc::clone(&reasoner))),
        Arc::new(ProfileAnalyzer::new(reasoner)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::TaxonomyReasoner;

    #[test]
    fn default_handlers_cover_every_kind() {
        let handlers = default_handlers(Arc::new(TaxonomyReasoner::new()));
        let mut kinds: Vec<AgentKind> = handlers.iter().map(|h| h.kind()).collect();
        kinds.sort_by_key(|k| k.as_str());
        let mut all = AgentKind::ALL.to_vec();
        all.sort_by_key(|k| k.as_str());
        assert_eq!(kinds, all);
    }
}
