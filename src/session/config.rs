use crate::speech::{SpeechRecognizer, SpeechSynthesizer};
use crate::translation::Translator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of one client connection, independent of the transport handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(format!("conn-{}", uuid::Uuid::new_v4()))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Configuration for a translation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Connection owning the session
    pub connection_id: ConnectionId,

    /// Language tag recognized from the client's audio (e.g. "en-US")
    pub source_lang: String,

    /// Language tag translated and synthesized into (e.g. "ja-JP")
    pub target_lang: String,
}

/// Language tags used when a client does not pick its own
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub source_lang: String,
    pub target_lang: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            source_lang: "en-US".to_string(),
            target_lang: "ja-JP".to_string(),
        }
    }
}

/// External services a session delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}
