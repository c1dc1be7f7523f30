//! Azure Speech collaborators
//!
//! Recognition speaks the service's streaming WebSocket protocol directly
//! (see [`super::messages`]); synthesis uses the REST endpoint.

use super::backend::{RecognitionEvent, RecognitionStream, SpeechRecognizer, SpeechSynthesizer};
use super::messages::{self, RecognitionStatus, ServiceMessage};
use crate::config::SpeechConfig;
use anyhow::{anyhow, bail, Context, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SYNTHESIS_OUTPUT_FORMAT: &str = "riff-16khz-16bit-mono-pcm";

/// Capacity of the recognition event channel
const EVENT_BUFFER: usize = 64;

fn check_credentials(config: &SpeechConfig) -> Result<()> {
    if config.key.is_empty() {
        bail!("Azure Speech key is not configured");
    }
    if config.region.is_empty() {
        bail!("Azure Speech region is not configured");
    }
    Ok(())
}

// ============================================================================
// Recognition
// ============================================================================

/// Continuous recognition over the Azure Speech WebSocket endpoint
pub struct AzureSpeechRecognizer {
    config: SpeechConfig,
}

impl AzureSpeechRecognizer {
    pub fn new(config: SpeechConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self, language: &str) -> Result<reqwest::Url> {
        let base = format!(
            "wss://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
            self.config.region
        );
        reqwest::Url::parse_with_params(&base, &[("language", language), ("format", "simple")])
            .context("Invalid recognition endpoint")
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for AzureSpeechRecognizer {
    async fn open(
        &self,
        language: &str,
    ) -> Result<(Box<dyn RecognitionStream>, mpsc::Receiver<RecognitionEvent>)> {
        check_credentials(&self.config)?;

        let url = self.endpoint(language)?;
        let connection_id = messages::request_id();

        let mut request = url
            .as_str()
            .into_client_request()
            .context("Invalid recognition request")?;
        let headers = request.headers_mut();
        headers.insert(
            "ocp-apim-subscription-key",
            HeaderValue::from_str(&self.config.key).context("Invalid Azure Speech key")?,
        );
        headers.insert(
            "x-connectionid",
            HeaderValue::from_str(&connection_id).context("Invalid connection id")?,
        );

        info!("Connecting to Azure Speech recognition ({}, {})", self.config.region, language);

        let (socket, _) = connect_async(request)
            .await
            .context("Failed to connect to Azure Speech recognition")?;

        info!("Recognition connection {} established", connection_id);

        let (sink, source) = socket.split();
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (turn_tx, turn_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        let writer = tokio::spawn(write_loop(sink, audio_rx, turn_rx, self.config.sample_rate));
        let reader = tokio::spawn(read_loop(source, event_tx, turn_tx));

        let stream = AzureRecognitionStream {
            audio_tx: Some(audio_tx),
            reader: Some(reader),
            writer: Some(writer),
        };

        Ok((Box::new(stream), event_rx))
    }

    fn name(&self) -> &str {
        "azure-speech"
    }
}

enum AudioCommand {
    Chunk(Vec<u8>),
    End,
}

/// Handle to one open Azure recognition connection
pub struct AzureRecognitionStream {
    audio_tx: Option<mpsc::UnboundedSender<AudioCommand>>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl RecognitionStream for AzureRecognitionStream {
    fn push(&mut self, chunk: Vec<u8>) -> Result<()> {
        let audio_tx = self
            .audio_tx
            .as_ref()
            .ok_or_else(|| anyhow!("Recognition audio sink is closed"))?;

        audio_tx
            .send(AudioCommand::Chunk(chunk))
            .map_err(|_| anyhow!("Recognition connection is gone"))
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(audio_tx) = &self.audio_tx {
            // Writer may already have exited after a service-side close
            let _ = audio_tx.send(AudioCommand::End);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.audio_tx.take();

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        // The writer finishes on its own once the sink channel is closed
        self.writer.take();
    }
}

impl Drop for AzureRecognitionStream {
    fn drop(&mut self) {
        self.close();
    }
}

async fn send_config(sink: &mut SplitSink<WsStream, Message>, request_id: &str) -> Result<()> {
    let message = messages::text_message(
        "speech.config",
        request_id,
        "application/json",
        &messages::speech_config_body(),
    );
    sink.send(Message::Text(message))
        .await
        .context("Failed to send speech.config")
}

async fn send_audio(
    sink: &mut SplitSink<WsStream, Message>,
    request_id: &str,
    payload: &[u8],
) -> Result<()> {
    sink.send(Message::Binary(messages::audio_message(request_id, payload)))
        .await
        .context("Failed to send audio")
}

/// Forward pushed audio to the service, one turn per request id
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut audio_rx: mpsc::UnboundedReceiver<AudioCommand>,
    mut turn_rx: mpsc::UnboundedReceiver<()>,
    sample_rate: u32,
) {
    let mut request_id = messages::request_id();
    let mut header_sent = false;

    if let Err(e) = send_config(&mut sink, &request_id).await {
        error!("{:#}", e);
        return;
    }

    loop {
        tokio::select! {
            command = audio_rx.recv() => match command {
                Some(AudioCommand::Chunk(chunk)) => {
                    if !header_sent {
                        let header = match messages::wav_header(sample_rate) {
                            Ok(header) => header,
                            Err(e) => {
                                error!("{:#}", e);
                                break;
                            }
                        };
                        if let Err(e) = send_audio(&mut sink, &request_id, &header).await {
                            error!("{:#}", e);
                            break;
                        }
                        header_sent = true;
                    }

                    if let Err(e) = send_audio(&mut sink, &request_id, &chunk).await {
                        error!("{:#}", e);
                        break;
                    }
                }
                Some(AudioCommand::End) | None => {
                    // Empty audio message marks end of stream
                    if let Err(e) = send_audio(&mut sink, &request_id, &[]).await {
                        debug!("{:#}", e);
                    }
                    break;
                }
            },
            Some(()) = turn_rx.recv() => {
                request_id = messages::request_id();
                header_sent = false;
                debug!("Recognition turn ended, continuing with request {}", request_id);
            }
        }
    }

    if let Err(e) = sink.close().await {
        debug!("Failed to close recognition socket: {}", e);
    }
    debug!("Recognition writer stopped");
}

/// Translate service messages into recognition events
async fn read_loop(
    mut source: SplitStream<WsStream>,
    events: mpsc::Sender<RecognitionEvent>,
    turn_tx: mpsc::UnboundedSender<()>,
) {
    let final_event = loop {
        let message = match source.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                break RecognitionEvent::Canceled {
                    reason: "transport error".to_string(),
                    details: Some(e.to_string()),
                };
            }
            None => break RecognitionEvent::SessionStopped,
        };

        let event = match message {
            Message::Text(text) => match messages::parse_service_message(&text) {
                Ok(message) => match service_event(message, &turn_tx) {
                    Some(event) => event,
                    None => continue,
                },
                Err(e) => {
                    warn!("Ignoring malformed service message: {:#}", e);
                    continue;
                }
            },
            Message::Close(Some(frame)) if frame.code != CloseCode::Normal => {
                break RecognitionEvent::Canceled {
                    reason: format!("connection closed ({})", frame.code),
                    details: Some(frame.reason.to_string()).filter(|r| !r.is_empty()),
                };
            }
            Message::Close(_) => break RecognitionEvent::SessionStopped,
            _ => continue,
        };

        let terminal = matches!(event, RecognitionEvent::Canceled { .. });
        if events.send(event).await.is_err() {
            return;
        }
        if terminal {
            return;
        }
    };

    let _ = events.send(final_event).await;
    debug!("Recognition reader stopped");
}

fn service_event(message: ServiceMessage, turn_tx: &mpsc::UnboundedSender<()>) -> Option<RecognitionEvent> {
    match message {
        ServiceMessage::Hypothesis { text } => Some(RecognitionEvent::Recognizing(text)),
        ServiceMessage::Phrase {
            status: RecognitionStatus::Success,
            text,
        } => Some(RecognitionEvent::Recognized(text.unwrap_or_default())),
        ServiceMessage::Phrase { status, .. } if status.is_no_match() => {
            Some(RecognitionEvent::NoMatch)
        }
        ServiceMessage::Phrase {
            status: RecognitionStatus::EndOfDictation,
            ..
        } => None,
        ServiceMessage::Phrase { status, .. } => Some(RecognitionEvent::Canceled {
            reason: format!("recognition failed with status {:?}", status),
            details: None,
        }),
        ServiceMessage::TurnEnd => {
            let _ = turn_tx.send(());
            None
        }
        other => {
            debug!("Service message: {:?}", other);
            None
        }
    }
}

// ============================================================================
// Synthesis
// ============================================================================

/// Text-to-speech over the Azure Speech REST endpoint
pub struct AzureSpeechSynthesizer {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl AzureSpeechSynthesizer {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build synthesis HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for AzureSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        check_credentials(&self.config)?;

        let url = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.config.region
        );

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.config.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", SYNTHESIS_OUTPUT_FORMAT)
            .header("User-Agent", env!("CARGO_PKG_NAME"))
            .body(ssml(text, voice))
            .send()
            .await
            .context("Failed to send synthesis request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Azure synthesis error ({}): {}", status, error_text);
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read synthesized audio")?;

        debug!("Synthesized {} bytes with {}", audio.len(), voice);

        Ok(audio.to_vec())
    }
}

/// SSML document speaking `text` with `voice`
pub fn ssml(text: &str, voice: &str) -> String {
    // Voice names start with their locale, e.g. "ja-JP-NanamiNeural"
    let lang = voice.splitn(3, '-').take(2).collect::<Vec<_>>().join("-");

    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        escape_xml(&lang),
        escape_xml(voice),
        escape_xml(text)
    )
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
