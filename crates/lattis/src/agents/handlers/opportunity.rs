//! Opportunity matching: roles worth pursuing now.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lattis_protocol::agent::{AgentKind, AgentMessage};

use crate::agents::{AgentHandler, HandlerContext, HandlerOutput};
use crate::collab::ReasoningService;

pub struct OpportunityMatcher {
    reasoner: Arc<dyn ReasoningService>,
}

impl OpportunityMatcher {
    pub fn new(reasoner: Arc<dyn ReasoningService>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl AgentHandler for OpportunityMatcher {
    fn kind(&self) -> AgentKind {
        AgentKind::OpportunityMatcher
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["role_matching", "readiness_scoring", "market_signals"]
    }

    async fn handle(
        &self,
        message: &AgentMessage,
        ctx: &HandlerContext,
    ) -> anyhow::Result<HandlerOutput> {
        let outcome = self
            .reasoner
            .analyze(self.kind(), &message.content, &ctx.profile)
            .await?;

        // Readiness: how much of the target role's skill set is evidenced.
        let matched = outcome.skills.len();
        let missing = outcome.gaps.len();
        let readiness = if matched + missing == 0 {
            0.0
        } else {
            matched as f64 / (matched + missing) as f64
        };

        let reply = match outcome.career_paths.first() {
            Some(target) if missing == 0 => format!(
                "You look ready to pursue {target} roles today; your evidenced \
                 skills cover everything those positions ask for."
            ),
            Some(target) => format!(
                "{target} roles are within reach. You cover {matched} of the \
                 core requirements; closing {} would make you a strong candidate.",
                outcome.gaps.join(" and ")
            ),
            None => "Share your current role or the kind of position you want \
                     and I'll score how ready you are for it."
                .to_string(),
        };

        let mut analysis = outcome.extras.clone();
        analysis.insert("matched_roles".to_string(), json!(outcome.career_paths));
        analysis.insert("readiness".to_string(), json!(readiness));
        analysis.insert("missing_skills".to_string(), json!(outcome.gaps));

        let mut action_items = Vec::new();
        if let Some(target) = outcome.career_paths.first() {
            action_items.push(format!("Save three open {target} listings for comparison"));
        }
        if let Some(gap) = outcome.gaps.first() {
            action_items.push(format!("Prioritize {gap}, it appears in most matched roles"));
        }

        Ok(HandlerOutput {
            reply,
            analysis,
            action_items,
            ledger_updates: Vec::new(),
            confidence: outcome.confidence,
        })
    }
}
