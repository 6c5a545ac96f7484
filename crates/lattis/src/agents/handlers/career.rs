//! Career guidance: progression paths and goal planning.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lattis_protocol::agent::{AgentKind, AgentMessage};

use crate::agents::{AgentHandler, HandlerContext, HandlerOutput};
use crate::collab::ReasoningService;

pub struct CareerAdvisor {
    reasoner: Arc<dyn ReasoningService>,
}

impl CareerAdvisor {
    pub fn new(reasoner: Arc<dyn ReasoningService>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl AgentHandler for CareerAdvisor {
    fn kind(&self) -> AgentKind {
        AgentKind::CareerAdvisor
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["career_paths", "goal_planning", "role_transitions"]
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

        let reply = if outcome.career_paths.is_empty() {
            "Tell me about your current role and what kind of work energizes \
             you, and I can map out concrete next steps for your career."
                .to_string()
        } else {
            format!(
                "Based on what you've shared, strong next steps for you would \
                 be: {}. Each builds directly on your current experience.",
                outcome.career_paths.join(", ")
            )
        };

        let mut analysis = outcome.extras.clone();
        analysis.insert("career_paths".to_string(), json!(outcome.career_paths));
        analysis.insert("skill_gaps".to_string(), json!(outcome.gaps));

        let mut action_items = Vec::new();
        if !outcome.career_paths.is_empty() {
            action_items.push(format!(
                "Research day-to-day responsibilities of a {}",
                outcome.career_paths[0]
            ));
        }
        for gap in outcome.gaps.iter().take(2) {
            action_items.push(format!("Close the {gap} gap with a focused project"));
        }
        if action_items.is_empty() {
            action_items.push("Share your current role so I can tailor a plan".to_string());
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
