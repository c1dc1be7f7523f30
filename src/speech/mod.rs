pub mod azure;
pub mod backend;
pub mod messages;

pub use azure::{AzureRecognitionStream, AzureSpeechRecognizer, AzureSpeechSynthesizer};
pub use backend::{RecognitionEvent, RecognitionStream, SpeechRecognizer, SpeechSynthesizer};
