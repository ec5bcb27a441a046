//! Microphone and speaker capabilities used by the live voice guide.

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::voice::pcm::{self, PcmBuffer};

/// Identifier of a scheduled playback buffer.
pub type BufferId = u64;

// ── Capture ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    /// Samples per delivered frame.
    pub frame_size: usize,
}

/// Handle that releases the underlying capture device.
pub trait CaptureTracks: Send {
    fn stop(&mut self);
}

/// An open microphone: mono f32 frames in capture order, plus the tracks
/// to stop when done.
pub struct MicStream {
    pub frames: mpsc::Receiver<Vec<f32>>,
    tracks: Box<dyn CaptureTracks>,
}

impl MicStream {
    pub fn new(frames: mpsc::Receiver<Vec<f32>>, tracks: Box<dyn CaptureTracks>) -> Self {
        Self { frames, tracks }
    }

    /// Stop every capture track. Safe to call more than once.
    pub fn stop(&mut self) {
        self.tracks.stop();
        self.frames.close();
    }
}

#[async_trait]
pub trait Microphone: Send + Sync {
    /// Acquire the microphone. Fails on permission denial.
    async fn open(&self, config: CaptureConfig) -> anyhow::Result<MicStream>;
}

/// Microphone fed from a raw little-endian f32 PCM file, delivered in
/// real time (one frame per frame duration).
pub struct FileMicrophone {
    path: PathBuf,
}

impl FileMicrophone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

struct TokenTracks(CancellationToken);

impl CaptureTracks for TokenTracks {
    fn stop(&mut self) {
        self.0.cancel();
    }
}

#[async_trait]
impl Microphone for FileMicrophone {
    async fn open(&self, config: CaptureConfig) -> anyhow::Result<MicStream> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Microphone unavailable: {}", self.path.display()))?;
        let samples = pcm::f32_from_le_bytes(&raw);
        let frame_size = config.frame_size.max(1);
        let frame_duration =
            Duration::from_secs_f64(frame_size as f64 / f64::from(config.sample_rate));

        let (tx, rx) = mpsc::channel(8);
        let token = CancellationToken::new();
        let child = token.clone();

        tracing::info!(
            path = %self.path.display(),
            samples = samples.len(),
            frame_size,
            "Opened file microphone"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_duration);
            for frame in samples.chunks(frame_size) {
                tokio::select! {
                    _ = child.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                if tx.send(frame.to_vec()).await.is_err() {
                    return;
                }
            }
            tracing::debug!("File microphone reached end of input");
        });

        Ok(MicStream::new(rx, Box::new(TokenTracks(token))))
    }
}

// ── Playback ─────────────────────────────────────────────────────

/// An open output device with its own audio clock.
pub trait PlaybackSink: Send {
    /// Audio clock in seconds.
    fn current_time(&self) -> f64;
    /// Schedule `buffer` to start at clock time `at`. The sink reports the
    /// id on its `ended` channel once playback finishes.
    fn start(&mut self, id: BufferId, buffer: PcmBuffer, at: f64) -> anyhow::Result<()>;
    /// Stop a scheduled or playing buffer. Unknown ids are ignored.
    fn stop(&mut self, id: BufferId);
    /// Stop everything and release the device.
    fn close(&mut self);
}

pub trait AudioOutput: Send + Sync {
    fn open(
        &self,
        sample_rate: u32,
        ended: mpsc::UnboundedSender<BufferId>,
    ) -> anyhow::Result<Box<dyn PlaybackSink>>;
}

/// Output with a wall-clock audio clock. Buffers "play" for their duration
/// and, when a recording path is set, the ones that played to the end are
/// written out as s16le PCM on close.
pub struct ClockedOutput {
    record_to: Option<PathBuf>,
}

impl ClockedOutput {
    pub fn new(record_to: Option<PathBuf>) -> Self {
        Self { record_to }
    }
}

impl AudioOutput for ClockedOutput {
    fn open(
        &self,
        sample_rate: u32,
        ended: mpsc::UnboundedSender<BufferId>,
    ) -> anyhow::Result<Box<dyn PlaybackSink>> {
        tracing::debug!(sample_rate, "Opened clocked output");
        Ok(Box::new(ClockedSink {
            epoch: Instant::now(),
            ended,
            pending: Arc::new(Mutex::new(HashMap::new())),
            recording: Arc::new(Mutex::new(Vec::new())),
            record_to: self.record_to.clone(),
            closed: false,
        }))
    }
}

struct ClockedSink {
    epoch: Instant,
    ended: mpsc::UnboundedSender<BufferId>,
    pending: Arc<Mutex<HashMap<BufferId, CancellationToken>>>,
    recording: Arc<Mutex<Vec<f32>>>,
    record_to: Option<PathBuf>,
    closed: bool,
}

impl PlaybackSink for ClockedSink {
    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start(&mut self, id: BufferId, buffer: PcmBuffer, at: f64) -> anyhow::Result<()> {
        if self.closed {
            anyhow::bail!("Playback sink is closed");
        }
        let finish_at = at + buffer.duration();
        let wait = (finish_at - self.current_time()).max(0.0);

        let token = CancellationToken::new();
        self.pending.lock().insert(id, token.clone());
        let pending = Arc::clone(&self.pending);
        let recording = self
            .record_to
            .is_some()
            .then(|| Arc::clone(&self.recording));
        let ended = self.ended.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs_f64(wait)) => {
                    pending.lock().remove(&id);
                    if let Some(recording) = recording {
                        recording.lock().extend_from_slice(&buffer.samples);
                    }
                    let _ = ended.send(id);
                }
            }
        });
        Ok(())
    }

    fn stop(&mut self, id: BufferId) {
        if let Some(token) = self.pending.lock().remove(&id) {
            token.cancel();
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for (_, token) in self.pending.lock().drain() {
            token.cancel();
        }
        if let Some(path) = self.record_to.take() {
            let bytes = pcm::f32_to_pcm16_le(&std::mem::take(&mut *self.recording.lock()));
            tokio::task::spawn_blocking(move || match std::fs::write(&path, bytes) {
                Ok(()) => tracing::info!(path = %path.display(), "Wrote playback recording"),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to write playback recording"
                ),
            });
        }
    }
}
