use super::config::ConnectionId;
use anyhow::{bail, Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

// ============================================================================
// Server → client
// ============================================================================

/// Event pushed to the client owning a session
///
/// Serialized as `{"event": <name>, "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum TranslationEvent {
    /// Partial hypothesis for the utterance in progress
    #[serde(rename = "recognizing_text")]
    Recognizing { text: String },

    /// All recognized text so far
    #[serde(rename = "recognized_text")]
    Recognized { text: String },

    /// All translated text so far
    #[serde(rename = "translated_text")]
    Translated { text: String },

    /// Base64-encoded synthesized audio for the latest translation
    #[serde(rename = "translation_audio")]
    Audio { audio: String },

    #[serde(rename = "translation_error")]
    Error { error: String },
}

impl TranslationEvent {
    pub fn audio(bytes: &[u8]) -> Self {
        Self::Audio {
            audio: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<TranslationEvent>;

/// Fire-and-forget push channel to one client
#[derive(Debug, Clone)]
pub struct EventSender {
    connection_id: ConnectionId,
    tx: mpsc::UnboundedSender<TranslationEvent>,
}

impl EventSender {
    pub fn channel(connection_id: ConnectionId) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { connection_id, tx }, rx)
    }

    /// Deliver an event; silently dropped if the client is gone
    pub fn emit(&self, event: TranslationEvent) {
        if self.tx.send(event).is_err() {
            debug!("[{}] Client gone, dropping event", self.connection_id);
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }
}

// ============================================================================
// Client → server
// ============================================================================

/// Payload of `start_translation`; missing tags fall back to the service defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StartTranslation {
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

/// Control message received as a text frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    StartTranslation(StartTranslation),
    StopTranslation,
    /// Audio chunk sent as base64 text instead of a binary frame
    AudioStream(Vec<u8>),
}

#[derive(Debug, Deserialize)]
struct RawClientMessage {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AudioPayload {
    audio: String,
}

impl ClientMessage {
    pub fn parse(raw: &str) -> Result<Self> {
        let message: RawClientMessage =
            serde_json::from_str(raw).context("Invalid client message")?;

        match message.event.as_str() {
            "start_translation" => {
                let request = if message.data.is_null() {
                    StartTranslation::default()
                } else {
                    serde_json::from_value(message.data)
                        .context("Invalid start_translation payload")?
                };
                Ok(Self::StartTranslation(request))
            }
            "stop_translation" => Ok(Self::StopTranslation),
            "audio_stream" => {
                let payload: AudioPayload = serde_json::from_value(message.data)
                    .context("Invalid audio_stream payload")?;
                let chunk = base64::engine::general_purpose::STANDARD
                    .decode(payload.audio)
                    .context("audio_stream payload is not valid base64")?;
                Ok(Self::AudioStream(chunk))
            }
            other => bail!("Unknown client event: {}", other),
        }
    }
}
