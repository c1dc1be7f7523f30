use super::config::{Collaborators, ConnectionId, SessionConfig, SessionDefaults};
use super::events::{ClientMessage, EventSender, StartTranslation, TranslationEvent};
use super::registry::SessionRegistry;
use super::session::{SessionFlow, TranslationSession};
use crate::error::SessionError;
use crate::speech::RecognitionEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Serial event loop state for one client connection
///
/// Client messages and recognizer events for the connection are applied one
/// at a time through this type; it never runs concurrently with itself.
pub struct ConnectionDispatcher {
    connection_id: ConnectionId,
    registry: Arc<SessionRegistry>,
    collaborators: Collaborators,
    defaults: SessionDefaults,
    events: EventSender,
    /// Recognizer events of the current session, if any
    recognition_rx: Option<mpsc::Receiver<RecognitionEvent>>,
}

impl ConnectionDispatcher {
    pub fn new(
        registry: Arc<SessionRegistry>,
        collaborators: Collaborators,
        defaults: SessionDefaults,
        events: EventSender,
    ) -> Self {
        Self {
            connection_id: events.connection_id().clone(),
            registry,
            collaborators,
            defaults,
            events,
            recognition_rx: None,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub async fn handle_client_message(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::StartTranslation(request) => {
                // Failure is already reported to the client
                let _ = self.start_translation(request).await;
            }
            ClientMessage::StopTranslation => self.stop_translation().await,
            ClientMessage::AudioStream(chunk) => self.push_audio(chunk).await,
        }
    }

    /// Replace any current session with a freshly started one
    pub async fn start_translation(&mut self, request: StartTranslation) -> Result<(), SessionError> {
        self.recognition_rx = None;
        self.registry.remove(&self.connection_id).await;

        let config = SessionConfig {
            connection_id: self.connection_id.clone(),
            source_lang: request
                .source_lang
                .unwrap_or_else(|| self.defaults.source_lang.clone()),
            target_lang: request
                .target_lang
                .unwrap_or_else(|| self.defaults.target_lang.clone()),
        };

        let mut session =
            TranslationSession::new(config, self.collaborators.clone(), self.events.clone());

        match session.start().await {
            Ok(recognition_rx) => {
                self.registry.register(self.connection_id.clone(), session).await;
                self.recognition_rx = Some(recognition_rx);
                Ok(())
            }
            Err(e) => {
                error!("[{}] {}", self.connection_id, e);
                self.events.emit(TranslationEvent::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn stop_translation(&mut self) {
        self.recognition_rx = None;
        if self.registry.remove(&self.connection_id).await {
            info!("[{}] Translation stopped by client", self.connection_id);
        }
    }

    /// Forward an audio chunk; dropped when no session is running
    pub async fn push_audio(&mut self, chunk: Vec<u8>) {
        let Some(session) = self.registry.get(&self.connection_id).await else {
            return;
        };

        let result = session.lock().await.push_audio(chunk);
        if let Err(e) = result {
            debug!("[{}] Dropping audio chunk: {}", self.connection_id, e);
        }
    }

    /// Wait for the current session's next recognizer event
    ///
    /// Pends forever while no session is running. A recognizer stream that
    /// closes without saying goodbye is reported as `SessionStopped`.
    pub async fn next_recognition_event(&mut self) -> RecognitionEvent {
        let event = match self.recognition_rx.as_mut() {
            Some(recognition_rx) => recognition_rx.recv().await,
            None => return futures::future::pending().await,
        };

        match event {
            Some(event) => event,
            None => {
                self.recognition_rx = None;
                RecognitionEvent::SessionStopped
            }
        }
    }

    pub async fn handle_recognition_event(&mut self, event: RecognitionEvent) {
        let Some(session) = self.registry.get(&self.connection_id).await else {
            self.recognition_rx = None;
            return;
        };

        let flow = session.lock().await.handle_recognition(event).await;

        if flow == SessionFlow::Ended {
            self.recognition_rx = None;
            self.registry.remove(&self.connection_id).await;
        }
    }

    /// Tear down the connection's session, if any
    pub async fn disconnect(&mut self) {
        self.recognition_rx = None;
        self.registry.remove(&self.connection_id).await;
        info!("Client disconnected: {}", self.connection_id);
    }
}
