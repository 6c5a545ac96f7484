//! Health, discovery, and connection introspection endpoints.

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Serialize;

use crate::agents::AgentDescriptor;
use crate::api::state::AppState;
use crate::registry::{ConnectionInfo, RegistryStats};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: i64,
    pub active_connections: usize,
    pub active_conversations: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "lattis",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        active_connections: state.registry.active_connections(),
        active_conversations: state.store.active_count(),
    })
}

#[derive(Serialize)]
pub struct AgentListing {
    pub agents: Vec<AgentDescriptor>,
}

/// GET /agents
pub async fn list_agents(State(state): State<AppState>) -> Json<AgentListing> {
    Json(AgentListing {
        agents: state.router.descriptors(),
    })
}

/// GET /connections/stats
pub async fn connection_stats(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.stats())
}

/// GET /connections/{user_id}
pub async fn connection_info(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ConnectionInfo> {
    Json(state.registry.connection_info(&user_id))
}
