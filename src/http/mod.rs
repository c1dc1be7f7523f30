//! HTTP API server for the live translator
//!
//! - GET /translator/ws - WebSocket streaming translation
//! - GET /translator/sessions - List live sessions
//! - GET /translator/sessions/:id - Query session status
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use handlers::{ErrorResponse, SessionListResponse};
pub use routes::create_router;
pub use state::AppState;
