//! Response shaping: every handler outcome, successful or not, becomes a
//! well-formed [`AgentResponse`] honoring the documented invariants.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;

use lattis_protocol::agent::{AgentKind, AgentMessage, AgentResponse};
use lattis_protocol::wire::ServerFrame;

use super::handler::HandlerOutput;

/// Reply text used whenever handling could not complete.
const DEGRADED_REPLY: &str = "I apologize, but I'm having trouble processing \
     your request right now. Please try again or contact support.";

/// Shape a successful handler output into a response.
///
/// Confidence is clamped to [0, 1] and processing time is never negative,
/// regardless of what the handler produced.
pub fn finalize(message: &AgentMessage, output: HandlerOutput, started: Instant) -> AgentResponse {
    AgentResponse {
        message_id: message.id.clone(),
        agent: message.agent,
        content: output.reply,
        analysis: output.analysis,
        action_items: output.action_items,
        ledger_updates: output.ledger_updates,
        confidence: output.confidence.clamp(0.0, 1.0),
        processing_seconds: started.elapsed().as_secs_f64().max(0.0),
        created_at: Utc::now(),
    }
}

/// Shape a failure into a degraded response carrying the error detail.
pub fn degraded(
    message_id: &str,
    agent: AgentKind,
    reason: &str,
    started: Instant,
) -> AgentResponse {
    let mut analysis = HashMap::new();
    analysis.insert("error".to_string(), json!(reason));
    AgentResponse {
        message_id: message_id.to_string(),
        agent,
        content: DEGRADED_REPLY.to_string(),
        analysis,
        action_items: vec!["Please try again in a few moments".to_string()],
        ledger_updates: Vec::new(),
        confidence: 0.0,
        processing_seconds: started.elapsed().as_secs_f64().max(0.0),
        created_at: Utc::now(),
    }
}

/// Project a response onto the client wire frame.
pub fn to_frame(response: &AgentResponse) -> ServerFrame {
    ServerFrame::AgentResponse {
        agent: response.agent,
        response: response.content.clone(),
        analysis: response.analysis.clone(),
        actions: response.action_items.clone(),
        timestamp: response.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> AgentMessage {
        AgentMessage::text("c1", AgentKind::CareerAdvisor, "u1", "hello")
    }

    #[test]
    fn finalize_clamps_confidence() {
        let msg = message();
        let over = HandlerOutput {
            confidence: 3.5,
            ..Default::default()
        };
        assert_eq!(finalize(&msg, over, Instant::now()).confidence, 1.0);

        let under = HandlerOutput {
            confidence: -0.2,
            ..Default::default()
        };
        assert_eq!(finalize(&msg, under, Instant::now()).confidence, 0.0);
    }

    #[test]
    fn finalize_links_message_and_agent() {
        let msg = message();
        let resp = finalize(&msg, HandlerOutput::default(), Instant::now());
        assert_eq!(resp.message_id, msg.id);
        assert_eq!(resp.agent, msg.agent);
        assert!(resp.processing_seconds >= 0.0);
    }

    #[test]
    fn degraded_carries_error_and_zero_confidence() {
        let msg = message();
        let resp = degraded(&msg.id, msg.agent, "handler exploded", Instant::now());
        assert_eq!(resp.confidence, 0.0);
        assert_eq!(resp.analysis["error"], json!("handler exploded"));
        assert!(resp.content.contains("try again"));
        assert!(!resp.action_items.is_empty());
    }

    #[test]
    fn frame_projection_matches_shape() {
        let msg = message();
        let resp = finalize(
            &msg,
            HandlerOutput {
                reply: "hi there".into(),
                confidence: 0.8,
                ..Default::default()
            },
            Instant::now(),
        );
        let value = serde_json::to_value(to_frame(&resp)).unwrap();
        assert_eq!(value["type"], "agent_response");
        assert_eq!(value["agent"], "career_advisor");
        assert_eq!(value["response"], "hi there");
        assert!(value["timestamp"].is_string());
    }
}
