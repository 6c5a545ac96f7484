//! Routing: pick the handler for a message and bound its execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, warn};

use lattis_protocol::agent::{AgentKind, AgentMessage, AgentResponse};

use super::handler::{AgentHandler, HandlerContext};
use super::response;

/// Why a dispatch produced a degraded response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    UnknownAgent,
    HandlerFailed(String),
    TimedOut,
}

/// Outcome of one dispatch. Always carries a well-formed response;
/// dispatch itself never fails.
#[derive(Debug, Clone)]
pub enum Dispatch {
    Completed(AgentResponse),
    Degraded {
        response: AgentResponse,
        reason: DegradeReason,
    },
}

impl Dispatch {
    pub fn response(&self) -> &AgentResponse {
        match self {
            Dispatch::Completed(response) => response,
            Dispatch::Degraded { response, .. } => response,
        }
    }

    pub fn into_response(self) -> AgentResponse {
        match self {
            Dispatch::Completed(response) => response,
            Dispatch::Degraded { response, .. } => response,
        }
    }
}

/// Listing entry for the agent discovery endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDescriptor {
    pub agent: AgentKind,
    pub capabilities: Vec<&'static str>,
}

/// Maps agent kinds to handlers and bounds every handler invocation with
/// a timeout ceiling.
pub struct AgentRouter {
    handlers: HashMap<AgentKind, Arc<dyn AgentHandler>>,
    timeout: Duration,
}

impl AgentRouter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            timeout,
        }
    }

    /// Register a handler under its own kind, replacing any prior one.
    pub fn register(&mut self, handler: Arc<dyn AgentHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Registered agents in advertised order.
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        AgentKind::ALL
            .iter()
            .filter_map(|kind| {
                self.handlers.get(kind).map(|h| AgentDescriptor {
                    agent: *kind,
                    capabilities: h.capabilities().to_vec(),
                })
            })
            .collect()
    }

    /// Route `message` to its handler.
    ///
    /// Every outcome, including a missing handler, a handler error, and a
    /// timeout, yields a response; callers never observe an error from
    /// dispatch itself.
    pub async fn dispatch(&self, message: &AgentMessage, ctx: &HandlerContext) -> Dispatch {
        let started = Instant::now();
        let Some(handler) = self.handlers.get(&message.agent) else {
            warn!(agent = %message.agent, "no handler registered");
            return Dispatch::Degraded {
                response: response::degraded(
                    &message.id,
                    message.agent,
                    &format!("no handler registered for agent {}", message.agent),
                    started,
                ),
                reason: DegradeReason::UnknownAgent,
            };
        };

        match tokio::time::timeout(self.timeout, handler.handle(message, ctx)).await {
            Ok(Ok(output)) => Dispatch::Completed(response::finalize(message, output, started)),
            Ok(Err(err)) => {
                error!(agent = %message.agent, error = %err, "handler failed");
                Dispatch::Degraded {
                    response: response::degraded(
                        &message.id,
                        message.agent,
                        &err.to_string(),
                        started,
                    ),
                    reason: DegradeReason::HandlerFailed(err.to_string()),
                }
            }
            Err(_) => {
                error!(agent = %message.agent, timeout = ?self.timeout, "handler timed out");
                Dispatch::Degraded {
                    response: response::degraded(
                        &message.id,
                        message.agent,
                        &format!("handler exceeded {:?} ceiling", self.timeout),
                        started,
                    ),
                    reason: DegradeReason::TimedOut,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::super::handler::HandlerOutput;
    use super::*;

    struct FixedHandler {
        kind: AgentKind,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl AgentHandler for FixedHandler {
        fn kind(&self) -> AgentKind {
            self.kind
        }

        fn capabilities(&self) -> &'static [&'static str] {
            &["test"]
        }

        async fn handle(
            &self,
            _message: &AgentMessage,
            _ctx: &HandlerContext,
        ) -> anyhow::Result<HandlerOutput> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                anyhow::bail!("synthetic failure");
            }
            Ok(HandlerOutput {
                reply: "ok".into(),
                confidence: 0.7,
                ..Default::default()
            })
        }
    }

    fn message(agent: AgentKind) -> AgentMessage {
        AgentMessage::text("c1", agent, "u1", "hello")
    }

    fn router_with(handler: FixedHandler) -> AgentRouter {
        let mut router = AgentRouter::new(Duration::from_millis(50));
        router.register(Arc::new(handler));
        router
    }

    #[tokio::test]
    async fn dispatch_completes_for_registered_handler() {
        let router = router_with(FixedHandler {
            kind: AgentKind::CareerAdvisor,
            delay: Duration::ZERO,
            fail: false,
        });
        let dispatch = router
            .dispatch(&message(AgentKind::CareerAdvisor), &HandlerContext::default())
            .await;
        assert!(matches!(dispatch, Dispatch::Completed(_)));
        assert_eq!(dispatch.response().content, "ok");
    }

    #[tokio::test]
    async fn unregistered_agent_degrades_with_zero_confidence() {
        let router = AgentRouter::new(Duration::from_millis(50));
        let dispatch = router
            .dispatch(&message(AgentKind::ProfileAnalyzer), &HandlerContext::default())
            .await;
        match &dispatch {
            Dispatch::Degraded { response, reason } => {
                assert_eq!(*reason, DegradeReason::UnknownAgent);
                assert_eq!(response.confidence, 0.0);
                assert!(response.analysis.contains_key("error"));
            }
            other => panic!("expected degraded dispatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handler_error_degrades_with_detail() {
        let router = router_with(FixedHandler {
            kind: AgentKind::SkillsAnalyzer,
            delay: Duration::ZERO,
            fail: true,
        });
        let dispatch = router
            .dispatch(&message(AgentKind::SkillsAnalyzer), &HandlerContext::default())
            .await;
        match dispatch {
            Dispatch::Degraded { response, reason } => {
                assert_eq!(reason, DegradeReason::HandlerFailed("synthetic failure".into()));
                assert_eq!(response.analysis["error"], "synthetic failure");
            }
            other => panic!("expected degraded dispatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_handler_hits_timeout_ceiling() {
        let router = router_with(FixedHandler {
            kind: AgentKind::NetworkConnector,
            delay: Duration::from_secs(5),
            fail: false,
        });
        let dispatch = router
            .dispatch(
                &message(AgentKind::NetworkConnector),
                &HandlerContext::default(),
            )
            .await;
        match dispatch {
            Dispatch::Degraded { response, reason } => {
                assert_eq!(reason, DegradeReason::TimedOut);
                assert_eq!(response.confidence, 0.0);
            }
            other => panic!("expected degraded dispatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn descriptors_follow_advertised_order() {
        let mut router = AgentRouter::new(Duration::from_millis(50));
        router.register(Arc::new(FixedHandler {
            kind: AgentKind::ProfileAnalyzer,
            delay: Duration::ZERO,
            fail: false,
        }));
        router.register(Arc::new(FixedHandler {
            kind: AgentKind::CareerAdvisor,
            delay: Duration::ZERO,
            fail: false,
        }));
        let kinds: Vec<AgentKind> = router.descriptors().iter().map(|d| d.agent).collect();
        assert_eq!(kinds, [AgentKind::CareerAdvisor, AgentKind::ProfileAnalyzer]);
    }
}
