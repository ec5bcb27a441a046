//! Transport seam between the voice session and a remote live model.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use super::VoiceEvent;

/// Audio chunk with MIME type and base64-encoded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaChunk {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64-encoded audio
}

impl MediaChunk {
    /// s16le PCM chunk at `sample_rate`.
    pub fn pcm(sample_rate: u32, data_b64: String) -> Self {
        Self {
            mime_type: format!("audio/pcm;rate={sample_rate}"),
            data: data_b64,
        }
    }
}

/// Outbound message to the live transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Realtime input chunk (captured microphone audio).
    Realtime(MediaChunk),
    /// Close the connection.
    Close,
}

/// An open live session: send on `outbound`, receive on `inbound`.
///
/// `inbound` yielding `None` means the remote side closed the session.
pub struct LiveLink {
    pub outbound: mpsc::Sender<OutboundMessage>,
    pub inbound: mpsc::Receiver<VoiceEvent>,
}

/// Opens live sessions.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    async fn connect(&self, session_id: &str) -> anyhow::Result<LiveLink>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_chunk_mime_carries_rate() {
        let chunk = MediaChunk::pcm(16_000, "AAA=".into());
        assert_eq!(chunk.mime_type, "audio/pcm;rate=16000");
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(json, r#"{"mimeType":"audio/pcm;rate=16000","data":"AAA="}"#);
    }
}
