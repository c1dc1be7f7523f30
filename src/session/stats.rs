use super::config::ConnectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a translation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Running,
    Stopped,
}

/// Snapshot of a translation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub connection_id: ConnectionId,

    pub state: SessionState,

    pub source_lang: String,

    pub target_lang: String,

    /// All recognized text so far, space-joined
    pub recognized_text: String,

    /// All translated text so far, space-joined
    pub translated_text: String,

    /// Number of finalized utterances
    pub utterances_recognized: usize,

    /// Number of utterances translated successfully
    pub utterances_translated: usize,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Time since creation in seconds
    pub duration_secs: f64,
}
