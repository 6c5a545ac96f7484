//! HTTP and WebSocket surface.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
