use anyhow::Result;
use tokio::sync::mpsc;

/// Events produced by a streaming recognizer, in the order the service reports them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Intermediate hypothesis for the utterance in progress
    Recognizing(String),
    /// Finalized utterance
    Recognized(String),
    /// The service finished an utterance but could not match any speech
    NoMatch,
    /// Recognition was canceled by the service or the transport failed
    Canceled { reason: String, details: Option<String> },
    /// The recognition session ended on the service side
    SessionStopped,
}

/// An open continuous-recognition stream
///
/// Audio is pushed through [`push`](RecognitionStream::push); results arrive on
/// the receiver returned alongside the stream by [`SpeechRecognizer::open`].
#[async_trait::async_trait]
pub trait RecognitionStream: Send + Sync {
    /// Forward raw PCM bytes to the recognizer's input sink
    fn push(&mut self, chunk: Vec<u8>) -> Result<()>;

    /// Stop continuous recognition
    async fn stop(&mut self) -> Result<()>;

    /// Close the audio input sink and release the recognizer
    fn close(&mut self);
}

/// Streaming speech-to-text collaborator
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Open a stream recognizing `language` and begin continuous recognition
    async fn open(
        &self,
        language: &str,
    ) -> Result<(Box<dyn RecognitionStream>, mpsc::Receiver<RecognitionEvent>)>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Single-shot text-to-speech collaborator
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with `voice`, returning encoded audio bytes
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}
