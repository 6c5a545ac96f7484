//! Test utilities and common setup.

use std::time::Duration;

use axum::Router;

use lattis::api::{AppState, build_router};

/// Build the full router with fast timeouts and no replay pacing.
pub fn test_app() -> Router {
    let state = AppState::new(Duration::from_secs(5), Duration::ZERO);
    build_router(state, &[])
}
