//! Translation session management
//!
//! This module provides the per-connection speech translation pipeline:
//! - `TranslationSession`: recognizer stream, accumulated text, translation worker
//! - `SessionRegistry`: at most one live session per connection
//! - `ConnectionDispatcher`: serial handling of one connection's events
//! - `TranslationEvent` / `EventSender`: push channel back to the client

mod config;
mod dispatcher;
mod events;
mod languages;
mod registry;
mod session;
mod stats;

pub use config::{Collaborators, ConnectionId, SessionConfig, SessionDefaults};
pub use dispatcher::ConnectionDispatcher;
pub use events::{ClientMessage, EventReceiver, EventSender, StartTranslation, TranslationEvent};
pub use languages::{display_name, voice_for, DEFAULT_VOICE};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{SessionFlow, TranslationSession};
pub use stats::{SessionState, SessionStats};
