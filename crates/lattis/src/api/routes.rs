//! Route table and middleware assembly.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{chat, conversations, misc, profiles};
use super::state::AppState;
use super::ws;

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(misc::health))
        .route("/agents", get(misc::list_agents))
        .route("/chat", post(chat::chat))
        .route("/conversations/{conversation_id}", get(conversations::get_conversation))
        .route(
            "/profiles/{user_id}",
            get(profiles::get_profile).put(profiles::put_profile),
        )
        .route("/connections/stats", get(misc::connection_stats))
        .route("/connections/{user_id}", get(misc::connection_info))
        .route("/ws/{user_id}", get(ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}
