//! Agent dispatch: handler seam, domain handlers, routing, and response
//! shaping.

mod handler;
pub mod handlers;
pub mod response;
mod router;

pub use handler::{AgentHandler, HandlerContext, HandlerOutput};
pub use router::{AgentDescriptor, AgentRouter, DegradeReason, Dispatch};
