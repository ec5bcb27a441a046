//! Live guide tab: one talk button over a [`VoiceSession`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::device::{AudioOutput, Microphone};
use crate::voice::{LiveConnector, SessionSettings, VoiceListener, VoiceSession, VoiceStatus};

/// Transcript lines shown under the talk button.
pub const VISIBLE_LINES: usize = 3;

/// Collects the guide's spoken lines in arrival order.
#[derive(Default)]
pub struct TranscriptLog {
    lines: Mutex<Vec<String>>,
}

impl TranscriptLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl VoiceListener for TranscriptLog {
    fn on_transcript(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}

pub struct VoiceGuideView {
    session: VoiceSession,
    transcript: Arc<TranscriptLog>,
}

impl VoiceGuideView {
    pub fn new(
        connector: Arc<dyn LiveConnector>,
        microphone: Arc<dyn Microphone>,
        output: Arc<dyn AudioOutput>,
        settings: SessionSettings,
    ) -> Self {
        let transcript = Arc::new(TranscriptLog::default());
        let session = VoiceSession::new(
            connector,
            microphone,
            output,
            transcript.clone(),
            settings,
        );
        Self {
            session,
            transcript,
        }
    }

    pub fn status(&self) -> VoiceStatus {
        self.session.status()
    }

    pub fn caption(&self) -> &'static str {
        self.status().caption()
    }

    pub fn subscribe(&self) -> watch::Receiver<VoiceStatus> {
        self.session.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Talk button: start when idle, stop when running.
    pub async fn toggle(&mut self) -> anyhow::Result<()> {
        if self.session.is_active() {
            self.session.stop().await;
            Ok(())
        } else {
            self.session.start().await
        }
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.session.start().await
    }

    pub async fn stop(&mut self) {
        self.session.stop().await;
    }

    /// Every line the guide has spoken this visit.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lines()
    }

    /// The most recent lines, oldest first.
    pub fn recent_lines(&self) -> Vec<String> {
        let lines = self.transcript.lines();
        let skip = lines.len().saturating_sub(VISIBLE_LINES);
        lines.into_iter().skip(skip).collect()
    }
}
