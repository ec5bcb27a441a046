//! Gemini Live WebSocket client for the voice guide.
//!
//! Implements the bidirectional streaming protocol for Google's Gemini
//! Live API (BidiGenerateContent).
//!
//! ## Protocol Overview
//!
//! 1. **Connect**: open WebSocket to the Gemini Live endpoint
//! 2. **Setup**: send initial configuration (model, voice, system prompt,
//!    output transcription)
//! 3. **Stream**: send audio chunks as `realtimeInput`, receive audio and
//!    transcripts as `serverContent`
//! 4. **Close**: gracefully close the WebSocket session
//!
//! Gemini Live may deliver JSON control messages in Binary frames as well
//! as Text frames, so both are parsed.

use async_trait::async_trait;
use base64::Engine;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::live::{LiveConnector, LiveLink, MediaChunk, OutboundMessage};
use super::VoiceEvent;
use crate::config::VoiceConfig as VoiceSettings;
use crate::gateway::prompts::LIVE_SYSTEM_INSTRUCTION;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Setup message (JSON sent as first frame) ───────────────────────

/// Top-level setup message for Gemini Live session initialization.
#[derive(Debug, Serialize)]
pub struct SetupMessage {
    pub setup: SetupPayload,
}

#[derive(Debug, Serialize)]
pub struct SetupPayload {
    pub model: String,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(rename = "outputAudioTranscription")]
    pub output_audio_transcription: Empty,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    pub response_modalities: Vec<String>,
    #[serde(rename = "speechConfig", skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
pub struct SpeechConfig {
    #[serde(rename = "voiceConfig")]
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
pub struct VoiceConfig {
    #[serde(rename = "prebuiltVoiceConfig")]
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
pub struct PrebuiltVoiceConfig {
    #[serde(rename = "voiceName")]
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

/// Serializes as `{}`.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// Build the setup message for a voice guide session.
pub fn build_setup_message(model: &str, voice_name: &str) -> SetupMessage {
    SetupMessage {
        setup: SetupPayload {
            model: format!("models/{model}"),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice_name.to_string(),
                        },
                    },
                }),
            },
            system_instruction: Some(SystemInstruction {
                parts: vec![TextPart {
                    text: LIVE_SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            output_audio_transcription: Empty::default(),
        },
    }
}

// ── Audio input message ────────────────────────────────────────────

/// Audio input message sent to Gemini Live.
#[derive(Debug, Serialize)]
pub struct RealtimeInputMessage {
    #[serde(rename = "realtimeInput")]
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Serialize)]
pub struct RealtimeInput {
    #[serde(rename = "mediaChunks")]
    pub media_chunks: Vec<MediaChunk>,
}

/// Wrap one captured chunk.
///
/// Wire format: `{"realtimeInput": {"mediaChunks": [{"mimeType": "audio/pcm;rate=16000", "data": "<base64>"}]}}`
pub fn build_audio_message(chunk: MediaChunk) -> RealtimeInputMessage {
    RealtimeInputMessage {
        realtime_input: RealtimeInput {
            media_chunks: vec![chunk],
        },
    }
}

// ── Server response parsing ────────────────────────────────────────

fn transcript_text(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|t| t.get("text"))
        .and_then(|v| v.as_str())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Parse a JSON frame from Gemini Live into a list of events.
///
/// A single server message can carry several events (e.g. an audio chunk
/// and a transcription). Frames that are not valid JSON yield no events.
pub fn parse_server_message(json_text: &str) -> Vec<VoiceEvent> {
    let mut events = Vec::new();

    let value: serde_json::Value = match serde_json::from_str(json_text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unparseable Gemini Live message");
            return events;
        }
    };

    if value.get("setupComplete").is_some() {
        events.push(VoiceEvent::SetupComplete);
    }

    if let Some(content) = value.get("serverContent") {
        if let Some(parts) = content
            .pointer("/modelTurn/parts")
            .and_then(|v| v.as_array())
        {
            for part in parts {
                if let Some(data_b64) = part.pointer("/inlineData/data").and_then(|v| v.as_str())
                {
                    match base64::engine::general_purpose::STANDARD.decode(data_b64) {
                        Ok(data) => events.push(VoiceEvent::Audio { data }),
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping audio part with invalid base64")
                        }
                    }
                }
            }
        }
        // Audio in the same message as the interruption is superseded by it.
        if content.get("interrupted").and_then(|v| v.as_bool()) == Some(true) {
            events.push(VoiceEvent::Interrupted);
        }
        if let Some(text) = transcript_text(content.get("inputTranscription")) {
            events.push(VoiceEvent::InputTranscript { text });
        }
        if let Some(text) = transcript_text(content.get("outputTranscription")) {
            events.push(VoiceEvent::OutputTranscript { text });
        }
        if content.get("turnComplete").and_then(|v| v.as_bool()) == Some(true) {
            events.push(VoiceEvent::TurnComplete);
        }
    }

    // Older servers send transcriptions at the top level.
    if let Some(text) = transcript_text(value.get("inputTranscription")) {
        events.push(VoiceEvent::InputTranscript { text });
    }
    if let Some(text) = transcript_text(value.get("outputTranscription")) {
        events.push(VoiceEvent::OutputTranscript { text });
    }

    if let Some(err) = value.get("error") {
        let message = err
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown server error");
        events.push(VoiceEvent::Error {
            message: message.to_string(),
        });
    }

    events
}

/// JSON payload of a frame, if it carries one.
fn frame_json(msg: &WsMessage) -> Option<&str> {
    match msg {
        WsMessage::Text(text) => Some(text.as_str()),
        WsMessage::Binary(data) if data.first() == Some(&b'{') => std::str::from_utf8(data).ok(),
        _ => None,
    }
}

// ── Connector ──────────────────────────────────────────────────────

/// Opens Gemini Live sessions.
pub struct GeminiLiveConnector {
    live_url: String,
    api_key: String,
    model: String,
    voice_name: String,
    setup_timeout: Duration,
}

impl GeminiLiveConnector {
    pub fn new(api_key: impl Into<String>, settings: &VoiceSettings) -> Self {
        Self {
            live_url: settings.live_url.clone(),
            api_key: api_key.into(),
            model: settings.model.clone(),
            voice_name: settings.voice_name.clone(),
            setup_timeout: Duration::from_secs(settings.setup_timeout_secs),
        }
    }

    async fn await_setup(&self, ws_stream: &mut WsStream, session_id: &str) -> anyhow::Result<()> {
        let wait = async {
            while let Some(msg_result) = ws_stream.next().await {
                match msg_result {
                    Ok(WsMessage::Close(frame)) => {
                        anyhow::bail!("Connection closed before setupComplete: {frame:?}");
                    }
                    Ok(msg) => {
                        if frame_json(&msg).is_some_and(|text| text.contains("setupComplete")) {
                            tracing::info!(
                                session_id = %session_id,
                                "Gemini Live setup complete, ready to stream"
                            );
                            return Ok(());
                        }
                        tracing::debug!(
                            session_id = %session_id,
                            msg = ?msg,
                            "Gemini Live setup phase: ignoring frame"
                        );
                    }
                    Err(e) => {
                        anyhow::bail!("WebSocket error before setupComplete: {e}");
                    }
                }
            }
            anyhow::bail!("Stream ended before setupComplete")
        };

        match tokio::time::timeout(self.setup_timeout, wait).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "Gemini Live setupComplete timeout ({}s)",
                self.setup_timeout.as_secs()
            ),
        }
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(&self, session_id: &str) -> anyhow::Result<LiveLink> {
        if self.api_key.is_empty() {
            anyhow::bail!("Gemini API key is not configured");
        }
        let url = format!("{}?key={}", self.live_url, self.api_key);

        tracing::info!(
            session_id = %session_id,
            model = %self.model,
            voice = %self.voice_name,
            "Connecting to Gemini Live"
        );

        let (mut ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Gemini Live: {e}"))?;

        let setup = build_setup_message(&self.model, &self.voice_name);
        let setup_json = serde_json::to_string(&setup)?;
        tracing::debug!(session_id = %session_id, setup = %setup_json, "Sending Gemini Live setup");
        ws_stream
            .send(WsMessage::Text(setup_json.into()))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send setup message: {e}"))?;

        self.await_setup(&mut ws_stream, session_id).await?;

        let (ws_sender, ws_receiver) = ws_stream.split();
        let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundMessage>(256);
        let (event_tx, event_rx) = mpsc::channel::<VoiceEvent>(256);

        let sid_out = session_id.to_string();
        tokio::spawn(async move {
            outbound_loop(outbound_rx, ws_sender, sid_out).await;
        });
        let sid_in = session_id.to_string();
        tokio::spawn(async move {
            inbound_loop(ws_receiver, event_tx, sid_in).await;
        });

        Ok(LiveLink {
            outbound: outbound_tx,
            inbound: event_rx,
        })
    }
}

// ── Internal loops ────────────────────────────────────────────────

/// Outbound loop: wrap chunks and send to the WebSocket. Ends on `Close`
/// or when the session drops its sender.
async fn outbound_loop(
    mut rx: mpsc::Receiver<OutboundMessage>,
    mut ws_sender: SplitSink<WsStream, WsMessage>,
    session_id: String,
) {
    let mut audio_chunk_count: u64 = 0;

    while let Some(msg) = rx.recv().await {
        match msg {
            OutboundMessage::Realtime(chunk) => {
                audio_chunk_count += 1;
                let json = match serde_json::to_string(&build_audio_message(chunk)) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(session_id = %session_id, error = %e, "Failed to serialize audio message");
                        continue;
                    }
                };
                if audio_chunk_count == 1 || audio_chunk_count.is_multiple_of(50) {
                    tracing::info!(
                        session_id = %session_id,
                        chunk = audio_chunk_count,
                        json_len = json.len(),
                        "Sending audio chunk to Gemini"
                    );
                }
                if ws_sender.send(WsMessage::Text(json.into())).await.is_err() {
                    tracing::warn!(
                        session_id = %session_id,
                        "WebSocket send failed, closing outbound loop"
                    );
                    return;
                }
            }
            OutboundMessage::Close => break,
        }
    }

    let _ = ws_sender.send(WsMessage::Close(None)).await;
    tracing::debug!(session_id = %session_id, chunks = audio_chunk_count, "Outbound loop terminated");
}

fn log_event(session_id: &str, elapsed: f32, event: &VoiceEvent) {
    match event {
        VoiceEvent::Audio { data } => {
            tracing::debug!(session_id = %session_id, t = format!("{elapsed:.1}s"), bytes = data.len(), "⬇ Gemini audio response");
        }
        VoiceEvent::TurnComplete => {
            tracing::info!(session_id = %session_id, t = format!("{elapsed:.1}s"), "⬇ Turn complete");
        }
        VoiceEvent::OutputTranscript { text } => {
            tracing::info!(session_id = %session_id, t = format!("{elapsed:.1}s"), text = %text, "⬇ Output transcript");
        }
        VoiceEvent::InputTranscript { text } => {
            tracing::info!(session_id = %session_id, t = format!("{elapsed:.1}s"), text = %text, "⬇ Input transcript");
        }
        VoiceEvent::Interrupted => {
            tracing::info!(session_id = %session_id, t = format!("{elapsed:.1}s"), "⬇ Interrupted");
        }
        VoiceEvent::Error { message } => {
            tracing::warn!(session_id = %session_id, t = format!("{elapsed:.1}s"), error = %message, "⬇ Server error");
        }
        VoiceEvent::SetupComplete => {}
    }
}

/// Inbound loop: parse frames and forward events. Dropping `event_tx` on
/// exit tells the session the remote side is gone.
async fn inbound_loop(
    mut ws_receiver: SplitStream<WsStream>,
    event_tx: mpsc::Sender<VoiceEvent>,
    session_id: String,
) {
    let start_time = std::time::Instant::now();

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(WsMessage::Close(frame)) => {
                tracing::info!(session_id = %session_id, close_frame = ?frame, "Gemini Live connection closed");
                break;
            }
            Ok(msg) => {
                let Some(text) = frame_json(&msg) else {
                    if let WsMessage::Binary(data) = &msg {
                        tracing::warn!(
                            session_id = %session_id,
                            len = data.len(),
                            "Unexpected non-JSON binary frame from Gemini Live, skipping"
                        );
                    }
                    continue;
                };
                let elapsed = start_time.elapsed().as_secs_f32();
                for event in parse_server_message(text) {
                    log_event(&session_id, elapsed, &event);
                    if event_tx.send(event).await.is_err() {
                        tracing::debug!(
                            session_id = %session_id,
                            "Event receiver dropped, closing inbound loop"
                        );
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Gemini Live WebSocket error");
                let _ = event_tx
                    .send(VoiceEvent::Error {
                        message: format!("WebSocket error: {e}"),
                    })
                    .await;
                break;
            }
        }
    }

    tracing::debug!(session_id = %session_id, "Inbound loop terminated");
}

// ── Tests ──────────────────────────────────────────────────────────
