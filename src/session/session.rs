use super::config::{Collaborators, ConnectionId, SessionConfig};
use super::events::{EventSender, TranslationEvent};
use super::languages::{display_name, voice_for};
use super::stats::{SessionState, SessionStats};
use crate::error::SessionError;
use crate::speech::{RecognitionEvent, RecognitionStream, SpeechSynthesizer};
use crate::translation::Translator;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What the dispatcher should do after a recognizer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    /// The recognizer is gone and the session has stopped itself
    Ended,
}

/// A live speech translation pipeline bound to one client connection
///
/// Recognizer events are fed in by the owning connection's dispatcher, one at
/// a time. Finalized utterances are handed to a per-session worker that
/// translates and synthesizes them in order, off the recognition path.
pub struct TranslationSession {
    config: SessionConfig,

    collaborators: Collaborators,

    events: EventSender,

    state: SessionState,

    /// Finalized utterances, space-joined
    recognized_text: String,

    /// Translations, space-joined; also guards the cancelled flag for emits
    translated_text: Arc<Mutex<String>>,

    /// Open recognition stream while running
    stream: Option<Box<dyn RecognitionStream>>,

    /// Queue feeding the translation worker
    utterance_tx: Option<mpsc::UnboundedSender<String>>,

    worker_handle: Option<JoinHandle<()>>,

    /// Set on stop; in-flight worker results are dropped once set
    cancelled: Arc<AtomicBool>,

    started_at: chrono::DateTime<Utc>,

    utterances_recognized: usize,

    utterances_translated: Arc<AtomicUsize>,
}

impl TranslationSession {
    pub fn new(config: SessionConfig, collaborators: Collaborators, events: EventSender) -> Self {
        Self {
            config,
            collaborators,
            events,
            state: SessionState::Created,
            recognized_text: String::new(),
            translated_text: Arc::new(Mutex::new(String::new())),
            stream: None,
            utterance_tx: None,
            worker_handle: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            started_at: Utc::now(),
            utterances_recognized: 0,
            utterances_translated: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.config.connection_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn recognized_text(&self) -> &str {
        &self.recognized_text
    }

    pub async fn translated_text(&self) -> String {
        self.translated_text.lock().await.clone()
    }

    /// Open the recognizer and begin continuous recognition
    ///
    /// Returns the recognizer's event stream, which the caller must feed back
    /// through [`handle_recognition`](Self::handle_recognition).
    pub async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>, SessionError> {
        if self.state != SessionState::Created {
            return Err(SessionError::AlreadyStarted);
        }

        info!(
            "[{}] Starting translation {} -> {} via {}",
            self.config.connection_id,
            self.config.source_lang,
            self.config.target_lang,
            self.collaborators.recognizer.name()
        );

        let (stream, recognition_rx) = self
            .collaborators
            .recognizer
            .open(&self.config.source_lang)
            .await
            .map_err(SessionError::Setup)?;

        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();

        let worker = TranslationWorker {
            connection_id: self.config.connection_id.clone(),
            source_lang: self.config.source_lang.clone(),
            target_lang: self.config.target_lang.clone(),
            translator: Arc::clone(&self.collaborators.translator),
            synthesizer: Arc::clone(&self.collaborators.synthesizer),
            events: self.events.clone(),
            translated_text: Arc::clone(&self.translated_text),
            cancelled: Arc::clone(&self.cancelled),
            utterances_translated: Arc::clone(&self.utterances_translated),
        };

        self.worker_handle = Some(tokio::spawn(worker.run(utterance_rx)));
        self.utterance_tx = Some(utterance_tx);
        self.stream = Some(stream);
        self.state = SessionState::Running;

        info!("[{}] Continuous recognition started", self.config.connection_id);

        Ok(recognition_rx)
    }

    /// Forward raw audio to the recognizer
    pub fn push_audio(&mut self, chunk: Vec<u8>) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::NotRunning);
        };

        // A dead recognizer reports itself through its event stream
        if let Err(e) = stream.push(chunk) {
            warn!("[{}] Failed to push audio: {:#}", self.config.connection_id, e);
        }

        Ok(())
    }

    /// Apply one recognizer event
    pub async fn handle_recognition(&mut self, event: RecognitionEvent) -> SessionFlow {
        if self.state != SessionState::Running {
            return SessionFlow::Ended;
        }

        match event {
            RecognitionEvent::Recognizing(text) => self.on_partial_result(&text),
            RecognitionEvent::Recognized(text) => self.on_final_result(&text),
            RecognitionEvent::NoMatch => {
                debug!("[{}] No match: speech could not be recognized", self.config.connection_id);
            }
            RecognitionEvent::Canceled { reason, details } => {
                let message = match details {
                    Some(details) => format!("Recognition canceled: {} ({})", reason, details),
                    None => format!("Recognition canceled: {}", reason),
                };
                warn!("[{}] {}", self.config.connection_id, message);
                self.events.emit(TranslationEvent::error(message));
                self.stop().await;
                return SessionFlow::Ended;
            }
            RecognitionEvent::SessionStopped => {
                info!("[{}] Recognition session stopped", self.config.connection_id);
                self.stop().await;
                return SessionFlow::Ended;
            }
        }

        SessionFlow::Continue
    }

    pub fn on_partial_result(&self, text: &str) {
        if text.is_empty() {
            return;
        }

        debug!("[{}] Recognizing: {}", self.config.connection_id, text);
        self.events.emit(TranslationEvent::Recognizing {
            text: text.to_string(),
        });
    }

    /// Record a finalized utterance and queue it for translation
    pub fn on_final_result(&mut self, text: &str) {
        let utterance = text.trim();
        if utterance.is_empty() {
            debug!("[{}] Empty utterance, treating as no match", self.config.connection_id);
            return;
        }

        info!("[{}] Recognized: {}", self.config.connection_id, utterance);

        append_utterance(&mut self.recognized_text, utterance);
        self.utterances_recognized += 1;

        self.events.emit(TranslationEvent::Recognized {
            text: self.recognized_text.clone(),
        });

        if let Some(utterance_tx) = &self.utterance_tx {
            if utterance_tx.send(utterance.to_string()).is_err() {
                warn!("[{}] Translation worker is gone", self.config.connection_id);
            }
        }
    }

    /// Stop recognition and release the recognizer; safe to call repeatedly
    pub async fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }

        self.state = SessionState::Stopped;

        {
            // Taken under the lock so the worker cannot emit after this point
            let _translated = self.translated_text.lock().await;
            self.cancelled.store(true, Ordering::SeqCst);
        }

        // Queued utterances are abandoned; an in-flight call finishes on its own
        self.utterance_tx.take();
        self.worker_handle.take();

        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.stop().await {
                warn!("[{}] Failed to stop recognition: {:#}", self.config.connection_id, e);
            }
            stream.close();
            info!("[{}] Continuous recognition stopped", self.config.connection_id);
        }
    }

    pub async fn get_stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            connection_id: self.config.connection_id.clone(),
            state: self.state,
            source_lang: self.config.source_lang.clone(),
            target_lang: self.config.target_lang.clone(),
            recognized_text: self.recognized_text.clone(),
            translated_text: self.translated_text().await,
            utterances_recognized: self.utterances_recognized,
            utterances_translated: self.utterances_translated.load(Ordering::SeqCst),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
        }
    }
}

fn append_utterance(accumulated: &mut String, utterance: &str) {
    if !accumulated.is_empty() {
        accumulated.push(' ');
    }
    accumulated.push_str(utterance);
}

/// Translates and synthesizes a session's utterances in finalization order
struct TranslationWorker {
    connection_id: ConnectionId,
    source_lang: String,
    target_lang: String,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    events: EventSender,
    translated_text: Arc<Mutex<String>>,
    cancelled: Arc<AtomicBool>,
    utterances_translated: Arc<AtomicUsize>,
}

impl TranslationWorker {
    async fn run(self, mut utterance_rx: mpsc::UnboundedReceiver<String>) {
        debug!("[{}] Translation worker started", self.connection_id);

        while let Some(utterance) = utterance_rx.recv().await {
            if self.is_cancelled() {
                break;
            }
            self.translate_and_synthesize(&utterance).await;
        }

        debug!("[{}] Translation worker stopped", self.connection_id);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn translate_and_synthesize(&self, utterance: &str) {
        let translated = match self
            .translator
            .translate(
                utterance,
                display_name(&self.source_lang),
                display_name(&self.target_lang),
            )
            .await
        {
            Ok(translated) => translated.trim().to_string(),
            Err(e) => {
                self.report_error(format!("Translation failed: {:#}", e)).await;
                return;
            }
        };

        if translated.is_empty() {
            self.report_error("Translation failed: empty translation".to_string())
                .await;
            return;
        }

        {
            let mut accumulated = self.translated_text.lock().await;
            if self.is_cancelled() {
                return;
            }
            append_utterance(&mut accumulated, &translated);
            self.utterances_translated.fetch_add(1, Ordering::SeqCst);
            self.events.emit(TranslationEvent::Translated {
                text: accumulated.clone(),
            });
        }

        let voice = voice_for(&self.target_lang);
        match self.synthesizer.synthesize(&translated, voice).await {
            Ok(audio) if audio.is_empty() => {
                warn!("[{}] Synthesis returned no audio", self.connection_id);
            }
            Ok(audio) => {
                let _guard = self.translated_text.lock().await;
                if !self.is_cancelled() {
                    self.events.emit(TranslationEvent::audio(&audio));
                }
            }
            Err(e) => {
                self.report_error(format!("Speech synthesis failed: {:#}", e)).await;
            }
        }
    }

    async fn report_error(&self, message: String) {
        let _guard = self.translated_text.lock().await;
        if self.is_cancelled() {
            return;
        }
        error!("[{}] Error in translation/synthesis: {}", self.connection_id, message);
        self.events.emit(TranslationEvent::error(message));
    }
}
