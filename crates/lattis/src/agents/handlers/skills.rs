//! Skill extraction and gap analysis.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lattis_protocol::agent::{AgentKind, AgentMessage, LedgerUpdate};

use crate::agents::{AgentHandler, HandlerContext, HandlerOutput};
use crate::collab::ReasoningService;

pub struct SkillsAnalyzer {
    reasoner: Arc<dyn ReasoningService>,
}

impl SkillsAnalyzer {
    pub fn new(reasoner: Arc<dyn ReasoningService>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl AgentHandler for SkillsAnalyzer {
    fn kind(&self) -> AgentKind {
        AgentKind::SkillsAnalyzer
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["skill_extraction", "gap_analysis", "skill_verification"]
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

        let reply = if outcome.skills.is_empty() {
            "I couldn't identify concrete skills in that. Describe recent \
             projects or tools you've used and I'll build your skill map."
                .to_string()
        } else {
            format!(
                "I identified these skills: {}. {}",
                outcome.skills.join(", "),
                if outcome.gaps.is_empty() {
                    "That's a solid foundation for your current direction.".to_string()
                } else {
                    format!(
                        "To round out your profile, focus next on: {}.",
                        outcome.gaps.join(", ")
                    )
                }
            )
        };

        let mut analysis = outcome.extras.clone();
        analysis.insert("skills".to_string(), json!(outcome.skills));
        analysis.insert("gaps".to_string(), json!(outcome.gaps));

        // Each newly evidenced skill becomes a pending profile record.
        let ledger_updates = outcome
            .skills
            .iter()
            .map(|skill| LedgerUpdate {
                operation: "record_skill".to_string(),
                subject: message.sender.clone(),
                payload: json!({ "skill": skill, "source": "chat" }),
            })
            .collect();

        let action_items = outcome
            .gaps
            .iter()
            .take(3)
            .map(|gap| format!("Add evidence of {gap} to your profile"))
            .collect();

        Ok(HandlerOutput {
            reply,
            analysis,
            action_items,
            ledger_updates,
            confidence: outcome.confidence,
        })
    }
}
