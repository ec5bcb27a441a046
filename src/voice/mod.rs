//! Live voice guide: a bidirectional audio conversation with the model.
//!
//! ## Design
//! - Capture: 4096-sample mono frames at 16 kHz, quantized to s16le and
//!   sent as base64 realtime input chunks
//! - Playback: 24 kHz s16le chunks decoded to f32 and scheduled gaplessly
//!   on the output clock (`playback::PlaybackScheduler`)
//! - Barge-in: an `Interrupted` event discards every scheduled buffer
//! - Transport behind `LiveConnector` so the pipeline runs against a
//!   scripted fake in tests; `gemini_live` is the production connector

pub mod gemini_live;
pub mod live;
pub mod pcm;
pub mod playback;
pub mod session;

use serde::{Deserialize, Serialize};

// ── Shared voice event type ──────────────────────────────────────

/// Event produced by a live transport.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// Provider setup completed, ready to stream.
    SetupComplete,
    /// Model audio chunk (PCM16, 24kHz mono), already base64-decoded.
    Audio { data: Vec<u8> },
    /// Transcription of user's speech (input).
    InputTranscript { text: String },
    /// Transcription of model's speech (output).
    OutputTranscript { text: String },
    /// Model finished a response turn.
    TurnComplete,
    /// The model was interrupted (user started speaking mid-response).
    Interrupted,
    /// Error from the provider or the transport.
    Error { message: String },
}

/// Externally visible state of the voice guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStatus {
    Idle,
    Connecting,
    Listening,
    Speaking,
}

impl VoiceStatus {
    /// Caption shown under the talk button.
    pub fn caption(self) -> &'static str {
        match self {
            Self::Idle => "Tap to start conversation",
            Self::Connecting => "Establishing Connection...",
            Self::Listening => "Listening...",
            Self::Speaking => "NomadAI is speaking",
        }
    }
}

#[allow(unused_imports)]
pub use gemini_live::GeminiLiveConnector;
#[allow(unused_imports)]
pub use live::{LiveConnector, LiveLink, MediaChunk, OutboundMessage};
#[allow(unused_imports)]
pub use session::{NoopListener, SessionSettings, VoiceListener, VoiceSession};
