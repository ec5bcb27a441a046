//! Voice session lifecycle: microphone → live transport → gapless playback.
//!
//! All capture, playback and scheduler state lives on one driver task. The
//! session handle only starts it, cancels it and reads the published status.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::live::{LiveConnector, LiveLink, MediaChunk, OutboundMessage};
use super::pcm;
use super::playback::PlaybackScheduler;
use super::{VoiceEvent, VoiceStatus};
use crate::config::VoiceConfig;
use crate::device::{AudioOutput, BufferId, CaptureConfig, MicStream, Microphone, PlaybackSink};

/// Receives transcript lines and status transitions.
pub trait VoiceListener: Send + Sync {
    fn on_transcript(&self, _text: &str) {}
    fn on_status_change(&self, _status: VoiceStatus) {}
}

/// Listener that ignores everything.
pub struct NoopListener;

impl VoiceListener for NoopListener {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    pub frame_size: usize,
}

impl From<&VoiceConfig> for SessionSettings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            input_sample_rate: config.input_sample_rate,
            output_sample_rate: config.output_sample_rate,
            frame_size: config.frame_size,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

/// Published status. Listeners hear about actual transitions only.
struct StatusCell {
    tx: watch::Sender<VoiceStatus>,
    listener: Arc<dyn VoiceListener>,
}

impl StatusCell {
    fn get(&self) -> VoiceStatus {
        *self.tx.borrow()
    }

    fn set(&self, status: VoiceStatus) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            tracing::debug!(status = ?status, "Voice status changed");
            self.listener.on_status_change(status);
        }
    }
}

struct ActiveSession {
    cancel: CancellationToken,
    driver: JoinHandle<()>,
}

/// A live voice conversation with the guide.
pub struct VoiceSession {
    connector: Arc<dyn LiveConnector>,
    microphone: Arc<dyn Microphone>,
    output: Arc<dyn AudioOutput>,
    listener: Arc<dyn VoiceListener>,
    settings: SessionSettings,
    status: Arc<StatusCell>,
    active: Option<ActiveSession>,
}

impl VoiceSession {
    pub fn new(
        connector: Arc<dyn LiveConnector>,
        microphone: Arc<dyn Microphone>,
        output: Arc<dyn AudioOutput>,
        listener: Arc<dyn VoiceListener>,
        settings: SessionSettings,
    ) -> Self {
        let (tx, _rx) = watch::channel(VoiceStatus::Idle);
        Self {
            connector,
            microphone,
            output,
            listener: Arc::clone(&listener),
            settings,
            status: Arc::new(StatusCell { tx, listener }),
            active: None,
        }
    }

    pub fn status(&self) -> VoiceStatus {
        self.status.get()
    }

    /// Watch status transitions.
    pub fn subscribe(&self) -> watch::Receiver<VoiceStatus> {
        self.status.tx.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.driver.is_finished())
    }

    /// Acquire the microphone, open the live session and start streaming.
    ///
    /// Any failure leaves the session `Idle` with everything acquired so far
    /// released.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.is_active() {
            anyhow::bail!("Voice session is already running");
        }
        self.active = None;
        self.status.set(VoiceStatus::Connecting);

        let capture = CaptureConfig {
            sample_rate: self.settings.input_sample_rate,
            frame_size: self.settings.frame_size,
        };
        let mut mic = match self.microphone.open(capture).await {
            Ok(mic) => mic,
            Err(e) => {
                tracing::warn!(error = %e, "Microphone unavailable");
                self.status.set(VoiceStatus::Idle);
                return Err(e.context("Microphone access denied"));
            }
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        let link = match self.connector.connect(&session_id).await {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Live session failed to open");
                mic.stop();
                self.status.set(VoiceStatus::Idle);
                return Err(e);
            }
        };

        let (ended_tx, ended_rx) = mpsc::unbounded_channel();
        let sink = match self.output.open(self.settings.output_sample_rate, ended_tx) {
            Ok(sink) => sink,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Audio output unavailable");
                mic.stop();
                let _ = link.outbound.try_send(OutboundMessage::Close);
                self.status.set(VoiceStatus::Idle);
                return Err(e);
            }
        };

        self.status.set(VoiceStatus::Listening);
        tracing::info!(session_id = %session_id, "Voice session started");

        let cancel = CancellationToken::new();
        let driver = Driver {
            session_id,
            mic,
            link,
            sink,
            ended: ended_rx,
            scheduler: PlaybackScheduler::new(),
            settings: self.settings,
            status: Arc::clone(&self.status),
            listener: Arc::clone(&self.listener),
        };
        let token = cancel.clone();
        let driver = tokio::spawn(driver.run(token));
        self.active = Some(ActiveSession { cancel, driver });
        Ok(())
    }

    /// Tear the session down. Safe to call at any time, any number of times.
    pub async fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            if let Err(e) = active.driver.await {
                tracing::warn!(error = %e, "Voice driver task ended abnormally");
            }
        }
        self.status.set(VoiceStatus::Idle);
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

// ── Driver task ───────────────────────────────────────────────────

struct Driver {
    session_id: String,
    mic: MicStream,
    link: LiveLink,
    sink: Box<dyn PlaybackSink>,
    ended: mpsc::UnboundedReceiver<BufferId>,
    scheduler: PlaybackScheduler,
    settings: SessionSettings,
    status: Arc<StatusCell>,
    listener: Arc<dyn VoiceListener>,
}

impl Driver {
    async fn run(mut self, cancel: CancellationToken) {
        let mut mic_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(session_id = %self.session_id, "Voice session cancelled");
                    break;
                }
                event = self.link.inbound.recv() => match event {
                    None => {
                        tracing::info!(session_id = %self.session_id, "Live session closed by remote");
                        break;
                    }
                    Some(VoiceEvent::Error { message }) => {
                        tracing::warn!(session_id = %self.session_id, error = %message, "Live session error");
                        break;
                    }
                    Some(event) => self.handle_event(event),
                },
                Some(id) = self.ended.recv() => {
                    if self.scheduler.finish(id) {
                        self.status.set(VoiceStatus::Listening);
                    }
                }
                frame = self.mic.frames.recv(), if mic_open => match frame {
                    Some(samples) => self.send_frame(&samples),
                    None => {
                        tracing::debug!(session_id = %self.session_id, "Microphone stream ended");
                        mic_open = false;
                    }
                },
            }
        }

        self.teardown();
    }

    fn send_frame(&self, samples: &[f32]) {
        let chunk = MediaChunk::pcm(self.settings.input_sample_rate, pcm::encode_frame(samples));
        match self.link.outbound.try_send(OutboundMessage::Realtime(chunk)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(session_id = %self.session_id, "Outbound queue full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(session_id = %self.session_id, "Outbound queue closed");
            }
        }
    }

    fn handle_event(&mut self, event: VoiceEvent) {
        match event {
            VoiceEvent::Audio { data } => self.play(&data),
            VoiceEvent::Interrupted => {
                for id in self.scheduler.interrupt() {
                    self.sink.stop(id);
                }
                self.status.set(VoiceStatus::Listening);
            }
            VoiceEvent::OutputTranscript { text } => self.listener.on_transcript(&text),
            VoiceEvent::InputTranscript { text } => {
                tracing::debug!(session_id = %self.session_id, text = %text, "User said");
            }
            VoiceEvent::SetupComplete | VoiceEvent::TurnComplete | VoiceEvent::Error { .. } => {}
        }
    }

    fn play(&mut self, data: &[u8]) {
        let buffer = pcm::buffer_from_pcm16(data, self.settings.output_sample_rate);
        if buffer.samples.is_empty() {
            return;
        }
        self.status.set(VoiceStatus::Speaking);

        let slot = self
            .scheduler
            .schedule(buffer.duration(), self.sink.current_time());
        if let Err(e) = self.sink.start(slot.id, buffer, slot.start_at) {
            tracing::warn!(session_id = %self.session_id, error = %e, "Failed to schedule playback");
            if self.scheduler.finish(slot.id) {
                self.status.set(VoiceStatus::Listening);
            }
        }
    }

    fn teardown(mut self) {
        self.mic.stop();
        for id in self.scheduler.interrupt() {
            self.sink.stop(id);
        }
        self.sink.close();
        let _ = self.link.outbound.try_send(OutboundMessage::Close);
        self.status.set(VoiceStatus::Idle);
        tracing::info!(session_id = %self.session_id, "Voice session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CaptureTracks;
    use crate::voice::pcm::PcmBuffer;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const CHUNK_SAMPLES: usize = 4096;

    // ── Fakes ─────────────────────────────────────────────────────

    struct FlagTracks(Arc<AtomicBool>);

    impl CaptureTracks for FlagTracks {
        fn stop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    struct FakeMic {
        stream: Mutex<Option<MicStream>>,
        stopped: Arc<AtomicBool>,
    }

    impl FakeMic {
        fn new() -> (Self, mpsc::Sender<Vec<f32>>) {
            let (tx, rx) = mpsc::channel(16);
            let stopped = Arc::new(AtomicBool::new(false));
            let stream = MicStream::new(rx, Box::new(FlagTracks(Arc::clone(&stopped))));
            (
                Self {
                    stream: Mutex::new(Some(stream)),
                    stopped,
                },
                tx,
            )
        }

        fn denied() -> Self {
            Self {
                stream: Mutex::new(None),
                stopped: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl Microphone for FakeMic {
        async fn open(&self, _config: CaptureConfig) -> anyhow::Result<MicStream> {
            self.stream
                .lock()
                .take()
                .ok_or_else(|| anyhow::anyhow!("permission denied"))
        }
    }

    struct FakeConnector {
        link: Mutex<Option<LiveLink>>,
        calls: AtomicUsize,
    }

    struct Remote {
        events: mpsc::Sender<VoiceEvent>,
        sent: mpsc::Receiver<OutboundMessage>,
    }

    impl FakeConnector {
        fn new() -> (Self, Remote) {
            let (event_tx, event_rx) = mpsc::channel(64);
            let (out_tx, out_rx) = mpsc::channel(256);
            let link = LiveLink {
                outbound: out_tx,
                inbound: event_rx,
            };
            (
                Self {
                    link: Mutex::new(Some(link)),
                    calls: AtomicUsize::new(0),
                },
                Remote {
                    events: event_tx,
                    sent: out_rx,
                },
            )
        }

        fn unreachable() -> Self {
            Self {
                link: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LiveConnector for FakeConnector {
        async fn connect(&self, _session_id: &str) -> anyhow::Result<LiveLink> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.link
                .lock()
                .take()
                .ok_or_else(|| anyhow::anyhow!("network unreachable"))
        }
    }

    #[derive(Default)]
    struct SinkLog {
        now: f64,
        started: Vec<(BufferId, f64, f64)>,
        stopped: Vec<BufferId>,
        closed: bool,
        ended: Option<mpsc::UnboundedSender<BufferId>>,
    }

    #[derive(Clone, Default)]
    struct FakeOutput(Arc<Mutex<SinkLog>>);

    impl FakeOutput {
        fn finish(&self, id: BufferId) {
            let log = self.0.lock();
            log.ended.as_ref().unwrap().send(id).unwrap();
        }
    }

    struct FakeSink(Arc<Mutex<SinkLog>>);

    impl AudioOutput for FakeOutput {
        fn open(
            &self,
            _sample_rate: u32,
            ended: mpsc::UnboundedSender<BufferId>,
        ) -> anyhow::Result<Box<dyn PlaybackSink>> {
            self.0.lock().ended = Some(ended);
            Ok(Box::new(FakeSink(Arc::clone(&self.0))))
        }
    }

    impl PlaybackSink for FakeSink {
        fn current_time(&self) -> f64 {
            self.0.lock().now
        }
        fn start(&mut self, id: BufferId, buffer: PcmBuffer, at: f64) -> anyhow::Result<()> {
            self.0.lock().started.push((id, at, buffer.duration()));
            Ok(())
        }
        fn stop(&mut self, id: BufferId) {
            self.0.lock().stopped.push(id);
        }
        fn close(&mut self) {
            self.0.lock().closed = true;
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        transcripts: Mutex<Vec<String>>,
        statuses: Mutex<Vec<VoiceStatus>>,
    }

    impl VoiceListener for RecordingListener {
        fn on_transcript(&self, text: &str) {
            self.transcripts.lock().push(text.to_string());
        }
        fn on_status_change(&self, status: VoiceStatus) {
            self.statuses.lock().push(status);
        }
    }

    struct Harness {
        session: VoiceSession,
        remote: Remote,
        mic_tx: mpsc::Sender<Vec<f32>>,
        mic_stopped: Arc<AtomicBool>,
        output: FakeOutput,
        listener: Arc<RecordingListener>,
    }

    async fn started() -> Harness {
        let (mic, mic_tx) = FakeMic::new();
        let mic_stopped = Arc::clone(&mic.stopped);
        let (connector, remote) = FakeConnector::new();
        let output = FakeOutput::default();
        let listener = Arc::new(RecordingListener::default());
        let mut session = VoiceSession::new(
            Arc::new(connector),
            Arc::new(mic),
            Arc::new(output.clone()),
            listener.clone(),
            SessionSettings::default(),
        );
        session.start().await.unwrap();
        Harness {
            session,
            remote,
            mic_tx,
            mic_stopped,
            output,
            listener,
        }
    }

    fn audio_chunk() -> VoiceEvent {
        VoiceEvent::Audio {
            data: vec![0u8; CHUNK_SAMPLES * 2],
        }
    }

    async fn until(cond: impl Fn() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    // ── Tests ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_moves_through_connecting_to_listening() {
        let h = started().await;
        assert_eq!(h.session.status(), VoiceStatus::Listening);
        assert_eq!(
            *h.listener.statuses.lock(),
            vec![VoiceStatus::Connecting, VoiceStatus::Listening]
        );
    }

    #[tokio::test]
    async fn consecutive_chunks_play_back_to_back() {
        let h = started().await;
        h.output.0.lock().now = 0.25;
        h.remote.events.send(audio_chunk()).await.unwrap();
        h.remote.events.send(audio_chunk()).await.unwrap();
        until(|| h.output.0.lock().started.len() == 2).await;

        let started = h.output.0.lock().started.clone();
        let (_, first_at, first_len) = started[0];
        let (_, second_at, _) = started[1];
        assert_eq!(first_at, 0.25);
        assert_eq!(second_at, first_at + first_len);
        assert!((first_len - CHUNK_SAMPLES as f64 / 24_000.0).abs() < 1e-12);
        assert_eq!(h.session.status(), VoiceStatus::Speaking);
    }

    #[tokio::test]
    async fn finishing_every_buffer_returns_to_listening() {
        let h = started().await;
        h.remote.events.send(audio_chunk()).await.unwrap();
        h.remote.events.send(audio_chunk()).await.unwrap();
        until(|| h.output.0.lock().started.len() == 2).await;

        let ids: Vec<BufferId> = h.output.0.lock().started.iter().map(|s| s.0).collect();
        h.output.finish(ids[0]);
        tokio::task::yield_now().await;
        assert_eq!(h.session.status(), VoiceStatus::Speaking);
        h.output.finish(ids[1]);
        let mut rx = h.session.subscribe();
        rx.wait_for(|s| *s == VoiceStatus::Listening).await.unwrap();
    }

    #[tokio::test]
    async fn interruption_discards_scheduled_audio() {
        let h = started().await;
        for _ in 0..3 {
            h.remote.events.send(audio_chunk()).await.unwrap();
        }
        until(|| h.output.0.lock().started.len() == 3).await;

        h.remote.events.send(VoiceEvent::Interrupted).await.unwrap();
        until(|| h.output.0.lock().stopped.len() == 3).await;
        assert_eq!(h.session.status(), VoiceStatus::Listening);

        // Cursor was reset, so the next chunk starts at the current clock.
        h.output.0.lock().now = 0.1;
        h.remote.events.send(audio_chunk()).await.unwrap();
        until(|| h.output.0.lock().started.len() == 4).await;
        assert_eq!(h.output.0.lock().started[3].1, 0.1);
    }

    #[tokio::test]
    async fn audio_sharing_a_message_with_interruption_is_not_left_playing() {
        let h = started().await;
        let events = crate::voice::gemini_live::parse_server_message(
            r#"{"serverContent": {"modelTurn": {"parts": [{"inlineData": {"data": "AAAAAA=="}}]}, "interrupted": true}}"#,
        );
        for event in events {
            h.remote.events.send(event).await.unwrap();
        }
        until(|| h.output.0.lock().stopped.len() == 1).await;

        let log = h.output.0.lock();
        assert_eq!(log.started.len(), 1);
        assert_eq!(log.stopped, vec![log.started[0].0]);
        drop(log);
        assert_eq!(h.session.status(), VoiceStatus::Listening);
    }

    #[tokio::test]
    async fn late_completion_after_interruption_is_ignored() {
        let h = started().await;
        h.remote.events.send(audio_chunk()).await.unwrap();
        until(|| h.output.0.lock().started.len() == 1).await;
        let id = h.output.0.lock().started[0].0;

        h.remote.events.send(VoiceEvent::Interrupted).await.unwrap();
        h.remote.events.send(audio_chunk()).await.unwrap();
        until(|| h.output.0.lock().started.len() == 2).await;

        h.output.finish(id);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.session.status(), VoiceStatus::Speaking);
    }

    #[tokio::test]
    async fn output_transcripts_reach_listener() {
        let h = started().await;
        h.remote
            .events
            .send(VoiceEvent::OutputTranscript {
                text: "The moss garden opens at nine.".into(),
            })
            .await
            .unwrap();
        until(|| h.listener.transcripts.lock().len() == 1).await;
        assert_eq!(
            h.listener.transcripts.lock()[0],
            "The moss garden opens at nine."
        );
    }

    #[tokio::test]
    async fn microphone_frames_go_out_as_pcm_chunks() {
        let mut h = started().await;
        let frame = vec![0.5f32, -0.5, 0.0, 0.25];
        h.mic_tx.send(frame.clone()).await.unwrap();

        let sent = h.remote.sent.recv().await.unwrap();
        assert_eq!(
            sent,
            OutboundMessage::Realtime(MediaChunk {
                mime_type: "audio/pcm;rate=16000".into(),
                data: pcm::encode_frame(&frame),
            })
        );
    }

    #[tokio::test]
    async fn remote_close_releases_everything() {
        let h = started().await;
        let Harness {
            session,
            remote,
            mic_stopped,
            output,
            ..
        } = h;
        drop(remote.events);

        let mut rx = session.subscribe();
        rx.wait_for(|s| *s == VoiceStatus::Idle).await.unwrap();
        assert!(mic_stopped.load(Ordering::SeqCst));
        assert!(output.0.lock().closed);
    }

    #[tokio::test]
    async fn transport_error_ends_session() {
        let h = started().await;
        h.remote
            .events
            .send(VoiceEvent::Error {
                message: "WebSocket error: reset".into(),
            })
            .await
            .unwrap();
        let mut rx = h.session.subscribe();
        rx.wait_for(|s| *s == VoiceStatus::Idle).await.unwrap();
        assert!(h.mic_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stop_twice_is_harmless() {
        let mut h = started().await;
        h.session.stop().await;
        h.session.stop().await;
        assert_eq!(h.session.status(), VoiceStatus::Idle);
        assert!(h.mic_stopped.load(Ordering::SeqCst));
        assert!(h.output.0.lock().closed);
        assert_eq!(h.remote.sent.recv().await, Some(OutboundMessage::Close));
    }

    #[tokio::test]
    async fn stop_discards_pending_playback() {
        let mut h = started().await;
        h.remote.events.send(audio_chunk()).await.unwrap();
        until(|| h.output.0.lock().started.len() == 1).await;
        h.session.stop().await;
        assert_eq!(h.output.0.lock().stopped.len(), 1);
    }

    #[tokio::test]
    async fn stop_before_start_stays_idle() {
        let (mic, _tx) = FakeMic::new();
        let (connector, _remote) = FakeConnector::new();
        let mut session = VoiceSession::new(
            Arc::new(connector),
            Arc::new(mic),
            Arc::new(FakeOutput::default()),
            Arc::new(NoopListener),
            SessionSettings::default(),
        );
        session.stop().await;
        assert_eq!(session.status(), VoiceStatus::Idle);
    }

    #[tokio::test]
    async fn second_start_while_running_is_rejected() {
        let mut h = started().await;
        assert!(h.session.start().await.is_err());
        assert_eq!(h.session.status(), VoiceStatus::Listening);
    }

    #[tokio::test]
    async fn microphone_denial_never_connects() {
        let connector = Arc::new(FakeConnector::unreachable());
        let listener = Arc::new(RecordingListener::default());
        let mut session = VoiceSession::new(
            connector.clone(),
            Arc::new(FakeMic::denied()),
            Arc::new(FakeOutput::default()),
            listener.clone(),
            SessionSettings::default(),
        );
        assert!(session.start().await.is_err());
        assert_eq!(session.status(), VoiceStatus::Idle);
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            *listener.statuses.lock(),
            vec![VoiceStatus::Connecting, VoiceStatus::Idle]
        );
    }

    #[tokio::test]
    async fn connect_failure_releases_microphone() {
        let (mic, _tx) = FakeMic::new();
        let mic_stopped = Arc::clone(&mic.stopped);
        let mut session = VoiceSession::new(
            Arc::new(FakeConnector::unreachable()),
            Arc::new(mic),
            Arc::new(FakeOutput::default()),
            Arc::new(NoopListener),
            SessionSettings::default(),
        );
        assert!(session.start().await.is_err());
        assert_eq!(session.status(), VoiceStatus::Idle);
        assert!(mic_stopped.load(Ordering::SeqCst));
    }
}
