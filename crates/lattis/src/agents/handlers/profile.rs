//! Profile review: completeness scoring and improvement hints.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lattis_protocol::agent::{AgentKind, AgentMessage, LedgerUpdate};

use crate::agents::{AgentHandler, HandlerContext, HandlerOutput};
use crate::collab::ReasoningService;

/// Profile fields that count toward completeness.
const EXPECTED_FIELDS: &[&str] = &["current_role", "skills", "headline", "location", "goals"];

pub struct ProfileAnalyzer {
    reasoner: Arc<dyn ReasoningService>,
}

impl ProfileAnalyzer {
    pub fn new(reasoner: Arc<dyn ReasoningService>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl AgentHandler for ProfileAnalyzer {
    fn kind(&self) -> AgentKind {
        AgentKind::ProfileAnalyzer
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["profile_review", "completeness_scoring", "field_suggestions"]
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

        let present: Vec<&str> = EXPECTED_FIELDS
            .iter()
            .copied()
            .filter(|f| ctx.profile.contains_key(*f))
            .collect();
        let missing: Vec<&str> = EXPECTED_FIELDS
            .iter()
            .copied()
            .filter(|f| !ctx.profile.contains_key(*f))
            .collect();
        let completeness = present.len() as f64 / EXPECTED_FIELDS.len() as f64;

        let reply = if missing.is_empty() {
            "Your profile covers all the essentials. Keep it fresh by \
             updating your skills as you pick up new ones."
                .to_string()
        } else {
            format!(
                "Your profile is {:.0}% complete. Adding {} would make it \
                 much stronger to both people and matching.",
                completeness * 100.0,
                missing.join(", ")
            )
        };

        let mut analysis = outcome.extras.clone();
        analysis.insert("completeness".to_string(), json!(completeness));
        analysis.insert("present_fields".to_string(), json!(present));
        analysis.insert("missing_fields".to_string(), json!(missing));

        // Role and skills evidenced in chat but absent from the profile
        // become pending profile updates.
        let mut ledger_updates = Vec::new();
        if !ctx.profile.contains_key("current_role")
            && let Some(role) = analysis.get("detected_role").cloned()
        {
            ledger_updates.push(LedgerUpdate {
                operation: "update_profile_field".to_string(),
                subject: message.sender.clone(),
                payload: json!({ "field": "current_role", "value": role }),
            });
        }
        if !ctx.profile.contains_key("skills") && !outcome.skills.is_empty() {
            ledger_updates.push(LedgerUpdate {
                operation: "update_profile_field".to_string(),
                subject: message.sender.clone(),
                payload: json!({ "field": "skills", "value": outcome.skills }),
            });
        }

        let action_items = missing
            .iter()
            .take(3)
            .map(|f| format!("Fill in the {} field on your profile", f.replace('_', " ")))
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
