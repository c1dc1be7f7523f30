// Scripted collaborators shared by the integration tests
//
// Each recognizer stream exposes a probe so tests can inject recognition
// events and count how often the stream was stopped and closed.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use portfolio_translator::session::{
    Collaborators, ConnectionDispatcher, ConnectionId, EventReceiver, EventSender,
    SessionDefaults, SessionRegistry, TranslationEvent,
};
use portfolio_translator::speech::{
    RecognitionEvent, RecognitionStream, SpeechRecognizer, SpeechSynthesizer,
};
use portfolio_translator::translation::Translator;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify, Semaphore};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Recognition
// ============================================================================

/// Handle on one stream opened by [`ScriptedRecognizer`]
#[derive(Clone)]
pub struct StreamProbe {
    pub language: String,
    events_tx: Arc<Mutex<Option<mpsc::Sender<RecognitionEvent>>>>,
    pub pushed: Arc<Mutex<Vec<Vec<u8>>>>,
    pub stops: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl StreamProbe {
    pub async fn emit(&self, event: RecognitionEvent) {
        let events_tx = self.events_tx.lock().unwrap().clone().expect("stream hung up");
        events_tx.send(event).await.unwrap();
    }

    /// Drop the recognizer's side of the event channel without a final event
    pub fn hang_up(&self) {
        self.events_tx.lock().unwrap().take();
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn pushed(&self) -> Vec<Vec<u8>> {
        self.pushed.lock().unwrap().clone()
    }
}

struct ScriptedStream {
    pushed: Arc<Mutex<Vec<Vec<u8>>>>,
    stops: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait::async_trait]
impl RecognitionStream for ScriptedStream {
    fn push(&mut self, chunk: Vec<u8>) -> Result<()> {
        if self.closed {
            return Err(anyhow!("stream closed"));
        }
        self.pushed.lock().unwrap().push(chunk);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct ScriptedRecognizer {
    fail_with: Option<String>,
    streams: Mutex<Vec<StreamProbe>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recognizer whose `open` always fails, like one with missing credentials
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    pub fn stream(&self, index: usize) -> StreamProbe {
        self.streams.lock().unwrap()[index].clone()
    }

    pub fn last_stream(&self) -> StreamProbe {
        self.streams.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn open(
        &self,
        language: &str,
    ) -> Result<(Box<dyn RecognitionStream>, mpsc::Receiver<RecognitionEvent>)> {
        if let Some(reason) = &self.fail_with {
            return Err(anyhow!("{}", reason));
        }

        let (events_tx, events_rx) = mpsc::channel(32);
        let probe = StreamProbe {
            language: language.to_string(),
            events_tx: Arc::new(Mutex::new(Some(events_tx))),
            pushed: Arc::new(Mutex::new(Vec::new())),
            stops: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        };

        let stream = ScriptedStream {
            pushed: Arc::clone(&probe.pushed),
            stops: Arc::clone(&probe.stops),
            closes: Arc::clone(&probe.closes),
            closed: false,
        };

        self.streams.lock().unwrap().push(probe);

        Ok((Box::new(stream), events_rx))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Translation
// ============================================================================

/// Returns queued responses in order; echoes the input once the queue is empty
#[derive(Default)]
pub struct ScriptedTranslator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<&str, &str>>) -> Self {
        let translator = Self::default();
        *translator.responses.lock().unwrap() = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        translator
    }

    /// Delay the translation of `text`
    pub fn delay(self, text: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().push((text.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        ));

        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(Ok(translated)) => Ok(translated),
            Some(Err(reason)) => Err(anyhow!("{}", reason)),
            None => Ok(text.to_uppercase()),
        }
    }
}

/// Blocks every call until [`release`](GatedTranslator::release) is called
pub struct GatedTranslator {
    gate: Semaphore,
    pub entered: Notify,
    response: String,
}

impl GatedTranslator {
    pub fn new(response: &str) -> Self {
        Self {
            gate: Semaphore::new(0),
            entered: Notify::new(),
            response: response.to_string(),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait::async_trait]
impl Translator for GatedTranslator {
    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
        self.entered.notify_one();
        let _permit = self.gate.acquire().await.map_err(|e| anyhow!("{}", e))?;
        Ok(self.response.clone())
    }
}

// ============================================================================
// Synthesis
// ============================================================================

pub struct ScriptedSynthesizer {
    result: Result<Vec<u8>, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedSynthesizer {
    pub fn returning(audio: &[u8]) -> Self {
        Self {
            result: Ok(audio.to_vec()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string()));
        self.result.clone().map_err(|reason| anyhow!("{}", reason))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn collaborators(
    recognizer: &Arc<ScriptedRecognizer>,
    translator: Arc<dyn Translator>,
    synthesizer: &Arc<ScriptedSynthesizer>,
) -> Collaborators {
    Collaborators {
        recognizer: recognizer.clone(),
        translator,
        synthesizer: synthesizer.clone(),
    }
}

/// Dispatcher for a fresh connection, with the receiving end of its event channel
pub fn connect(
    registry: &Arc<SessionRegistry>,
    collaborators: Collaborators,
) -> (ConnectionDispatcher, EventReceiver) {
    let (events, event_rx) = EventSender::channel(ConnectionId::new());
    let dispatcher = ConnectionDispatcher::new(
        Arc::clone(registry),
        collaborators,
        SessionDefaults::default(),
        events,
    );
    (dispatcher, event_rx)
}

/// Feed the next recognizer event of the current session through the dispatcher
pub async fn pump(dispatcher: &mut ConnectionDispatcher) {
    let event = tokio::time::timeout(EVENT_TIMEOUT, dispatcher.next_recognition_event())
        .await
        .expect("no recognition event");
    dispatcher.handle_recognition_event(event).await;
}

pub async fn next_event(event_rx: &mut EventReceiver) -> TranslationEvent {
    tokio::time::timeout(EVENT_TIMEOUT, event_rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

pub async fn assert_no_event(event_rx: &mut EventReceiver) {
    if let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(100), event_rx.recv()).await {
        panic!("unexpected event: {:?}", event);
    }
}

pub fn text_event(event: &TranslationEvent) -> (&'static str, String) {
    match event {
        TranslationEvent::Recognizing { text } => ("recognizing", text.clone()),
        TranslationEvent::Recognized { text } => ("recognized", text.clone()),
        TranslationEvent::Translated { text } => ("translated", text.clone()),
        TranslationEvent::Audio { audio } => ("audio", audio.clone()),
        TranslationEvent::Error { error } => ("error", error.clone()),
    }
}
