//! Networking suggestions: who to meet and where.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lattis_protocol::agent::{AgentKind, AgentMessage};

use crate::agents::{AgentHandler, HandlerContext, HandlerOutput};
use crate::collab::ReasoningService;

pub struct NetworkConnector {
    reasoner: Arc<dyn ReasoningService>,
}

impl NetworkConnector {
    pub fn new(reasoner: Arc<dyn ReasoningService>) -> Self {
        Self { reasoner }
    }

    fn communities_for(skills: &[String]) -> Vec<String> {
        let mut communities = Vec::new();
        for skill in skills {
            let lower = skill.to_lowercase();
            let community = match lower.as_str() {
                "rust" => Some("the Rust community meetups"),
                "python" | "machine learning" | "statistics" => {
                    Some("local data and ML study groups")
                }
                "javascript" | "typescript" | "react" => Some("frontend developer circles"),
                "leadership" | "mentoring" => Some("engineering leadership forums"),
                _ => None,
            };
            if let Some(c) = community {
                let c = c.to_string();
                if !communities.contains(&c) {
                    communities.push(c);
                }
            }
        }
        communities
    }
}

#[async_trait]
impl AgentHandler for NetworkConnector {
    fn kind(&self) -> AgentKind {
        AgentKind::NetworkConnector
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["introductions", "community_suggestions", "event_discovery"]
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

        let communities = Self::communities_for(&outcome.skills);
        let reply = if communities.is_empty() && outcome.career_paths.is_empty() {
            "Tell me what field you work in or what roles interest you, and \
             I'll point you at the right people and communities."
                .to_string()
        } else {
            let mut parts = Vec::new();
            if !communities.is_empty() {
                parts.push(format!("You'd fit right into {}", communities.join(" and ")));
            }
            if let Some(target) = outcome.career_paths.first() {
                parts.push(format!(
                    "connecting with people already working as a {target} would \
                     give you an inside view of that path"
                ));
            }
            parts.join(", and ") + "."
        };

        let mut analysis = outcome.extras.clone();
        analysis.insert("communities".to_string(), json!(communities));
        analysis.insert("target_roles".to_string(), json!(outcome.career_paths));

        let mut action_items: Vec<String> = communities
            .iter()
            .take(2)
            .map(|c| format!("Attend one event from {c} this month"))
            .collect();
        if let Some(target) = outcome.career_paths.first() {
            action_items.push(format!("Request an intro to a {target} in your network"));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::TaxonomyReasoner;

    #[tokio::test]
    async fn skills_map_to_communities() {
        let connector = NetworkConnector::new(Arc::new(TaxonomyReasoner::new()));
        let msg = AgentMessage::text(
            "c1",
            AgentKind::NetworkConnector,
            "u1",
            "I mostly write rust, who should I meet?",
        );
        let out = connector.handle(&msg, &HandlerContext::default()).await.unwrap();
        assert!(out.reply.contains("Rust community"));
        assert!(!out.action_items.is_empty());
    }

    #[tokio::test]
    async fn no_signal_asks_for_field() {
        let connector = NetworkConnector::new(Arc::new(TaxonomyReasoner::new()));
        let msg = AgentMessage::text("c1", AgentKind::NetworkConnector, "u1", "hi");
        let out = connector.handle(&msg, &HandlerContext::default()).await.unwrap();
        assert!(out.reply.contains("what field"));
    }
}
