pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod speech;
pub mod translation;

pub use config::Config;
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use session::{
    Collaborators, ConnectionDispatcher, ConnectionId, SessionRegistry, SessionStats,
    TranslationEvent, TranslationSession,
};
pub use speech::{RecognitionEvent, RecognitionStream, SpeechRecognizer, SpeechSynthesizer};
pub use translation::Translator;
