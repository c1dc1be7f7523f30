//! Azure Speech WebSocket wire format
//!
//! Text messages are HTTP-style header blocks followed by a blank line and a
//! JSON body. Binary messages carry a 2-byte big-endian header length, the
//! header block, then the raw payload.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use std::io::Cursor;

const AUDIO_CONTENT_TYPE: &str = "audio/x-wav";

/// Message received from the recognition service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceMessage {
    TurnStart,
    TurnEnd,
    SpeechStartDetected,
    SpeechEndDetected,
    Hypothesis { text: String },
    Phrase { status: RecognitionStatus, text: Option<String> },
    Other(String),
}

/// `RecognitionStatus` of a `speech.phrase` message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum RecognitionStatus {
    Success,
    NoMatch,
    InitialSilenceTimeout,
    BabbleTimeout,
    Error,
    EndOfDictation,
    #[serde(other)]
    Unknown,
}

impl RecognitionStatus {
    /// Statuses that end the utterance without recognized speech
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            Self::NoMatch | Self::InitialSilenceTimeout | Self::BabbleTimeout
        )
    }
}

#[derive(Debug, Deserialize)]
struct HypothesisBody {
    #[serde(rename = "Text")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct PhraseBody {
    #[serde(rename = "RecognitionStatus")]
    status: RecognitionStatus,
    #[serde(rename = "DisplayText")]
    display_text: Option<String>,
}

/// Current time in the format the service expects for `X-Timestamp`
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fresh request id (32 hex digits, no dashes)
pub fn request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Build a text message such as `speech.config`
pub fn text_message(path: &str, request_id: &str, content_type: &str, body: &str) -> String {
    format!(
        "Path: {}\r\nX-RequestId: {}\r\nX-Timestamp: {}\r\nContent-Type: {}\r\n\r\n{}",
        path,
        request_id,
        timestamp(),
        content_type,
        body
    )
}

/// Build a binary `audio` message; an empty payload marks end of audio
pub fn audio_message(request_id: &str, payload: &[u8]) -> Vec<u8> {
    let header = format!(
        "Path: audio\r\nX-RequestId: {}\r\nX-Timestamp: {}\r\nContent-Type: {}\r\n",
        request_id,
        timestamp(),
        AUDIO_CONTENT_TYPE
    );
    let header = header.as_bytes();

    let mut message = Vec::with_capacity(2 + header.len() + payload.len());
    message.extend_from_slice(&(header.len() as u16).to_be_bytes());
    message.extend_from_slice(header);
    message.extend_from_slice(payload);
    message
}

/// `speech.config` body identifying this client
pub fn speech_config_body() -> String {
    serde_json::json!({
        "context": {
            "system": { "version": env!("CARGO_PKG_VERSION") },
            "os": {
                "platform": std::env::consts::OS,
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "audio": {
                "source": { "type": "Stream", "connectivity": "Unknown", "manufacturer": "", "model": "" }
            }
        }
    })
    .to_string()
}

/// Header of a 16-bit mono PCM WAV stream with an unspecified length
pub fn wav_header(sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let writer = hound::WavWriter::new(&mut cursor, spec).context("Failed to write WAV header")?;
    writer.finalize().context("Failed to finalize WAV header")?;

    Ok(cursor.into_inner())
}

/// Parse a text message from the service
pub fn parse_service_message(raw: &str) -> Result<ServiceMessage> {
    let (headers, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));

    let path = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("path"))
        .map(|(_, value)| value.trim().to_ascii_lowercase())
        .context("Service message has no Path header")?;

    let message = match path.as_str() {
        "turn.start" => ServiceMessage::TurnStart,
        "turn.end" => ServiceMessage::TurnEnd,
        "speech.startdetected" => ServiceMessage::SpeechStartDetected,
        "speech.enddetected" => ServiceMessage::SpeechEndDetected,
        "speech.hypothesis" | "speech.fragment" => {
            let body: HypothesisBody =
                serde_json::from_str(body).context("Invalid speech.hypothesis body")?;
            ServiceMessage::Hypothesis { text: body.text }
        }
        "speech.phrase" => {
            let body: PhraseBody =
                serde_json::from_str(body).context("Invalid speech.phrase body")?;
            ServiceMessage::Phrase {
                status: body.status,
                text: body.display_text,
            }
        }
        _ => ServiceMessage::Other(path),
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_message_header_length_prefix() {
        let message = audio_message("abc", &[1, 2, 3]);
        let header_len = u16::from_be_bytes([message[0], message[1]]) as usize;
        let header = std::str::from_utf8(&message[2..2 + header_len]).unwrap();

        assert!(header.starts_with("Path: audio\r\n"));
        assert!(header.contains("X-RequestId: abc\r\n"));
        assert!(header.ends_with("Content-Type: audio/x-wav\r\n"));
        assert_eq!(&message[2 + header_len..], &[1, 2, 3]);
    }

    #[test]
    fn test_parse_hypothesis() {
        let raw = "X-RequestId: 1\r\nContent-Type: application/json\r\nPath: speech.hypothesis\r\n\r\n{\"Text\":\"hello wor\",\"Offset\":100,\"Duration\":200}";
        let message = parse_service_message(raw).unwrap();
        assert_eq!(
            message,
            ServiceMessage::Hypothesis {
                text: "hello wor".to_string()
            }
        );
    }

    #[test]
    fn test_parse_phrase_success_and_no_match() {
        let raw = "Path: speech.phrase\r\n\r\n{\"RecognitionStatus\":\"Success\",\"DisplayText\":\"Hello there.\"}";
        assert_eq!(
            parse_service_message(raw).unwrap(),
            ServiceMessage::Phrase {
                status: RecognitionStatus::Success,
                text: Some("Hello there.".to_string())
            }
        );

        let raw = "Path: speech.phrase\r\n\r\n{\"RecognitionStatus\":\"InitialSilenceTimeout\"}";
        match parse_service_message(raw).unwrap() {
            ServiceMessage::Phrase { status, text } => {
                assert!(status.is_no_match());
                assert!(text.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_status_and_path() {
        let raw = "Path: speech.phrase\r\n\r\n{\"RecognitionStatus\":\"SomethingNew\"}";
        match parse_service_message(raw).unwrap() {
            ServiceMessage::Phrase { status, .. } => assert_eq!(status, RecognitionStatus::Unknown),
            other => panic!("unexpected message: {:?}", other),
        }

        let raw = "Path: Turn.End\r\n\r\n{}";
        assert_eq!(parse_service_message(raw).unwrap(), ServiceMessage::TurnEnd);

        let raw = "Path: speech.keyword\r\n\r\n{}";
        assert_eq!(
            parse_service_message(raw).unwrap(),
            ServiceMessage::Other("speech.keyword".to_string())
        );
    }

    #[test]
    fn test_parse_missing_path_is_error() {
        assert!(parse_service_message("Content-Type: text/plain\r\n\r\n").is_err());
    }

    #[test]
    fn test_wav_header_is_riff() {
        let header = wav_header(16000).unwrap();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(header.len(), 44);
    }
}
