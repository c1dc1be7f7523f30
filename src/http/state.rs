use crate::config::Config;
use crate::session::{Collaborators, SessionDefaults, SessionRegistry};
use crate::speech::{AzureSpeechRecognizer, AzureSpeechSynthesizer};
use crate::translation::GeminiTranslator;
use anyhow::Result;
use std::sync::Arc;

/// Shared application state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Active translation sessions (connection id → session)
    pub sessions: Arc<SessionRegistry>,

    pub collaborators: Collaborators,

    pub defaults: SessionDefaults,
}

impl AppState {
    pub fn new(collaborators: Collaborators, defaults: SessionDefaults) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            collaborators,
            defaults,
        }
    }

    /// Azure Speech recognition/synthesis and Gemini translation
    pub fn from_config(config: &Config) -> Result<Self> {
        let collaborators = Collaborators {
            recognizer: Arc::new(AzureSpeechRecognizer::new(config.speech.clone())),
            translator: Arc::new(GeminiTranslator::new(config.translation.clone())?),
            synthesizer: Arc::new(AzureSpeechSynthesizer::new(config.speech.clone())?),
        };

        let defaults = SessionDefaults {
            source_lang: config.translator.default_source_lang.clone(),
            target_lang: config.translator.default_target_lang.clone(),
        };

        Ok(Self::new(collaborators, defaults))
    }
}
