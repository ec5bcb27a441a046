//! Sample-format contract for the live voice session.
//!
//! Capture: f32 in `[-1.0, 1.0]` → i16 (`sample * 32768`, saturating) →
//! little-endian bytes → base64. Playback: base64 → little-endian i16 →
//! f32 (`sample / 32768.0`). Base64 decoding of inbound chunks happens in
//! the transport's message parser.

use base64::Engine;

/// Scale between normalized floats and 16-bit PCM.
const PCM16_SCALE: f32 = 32768.0;

/// Decoded, playable mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Playback length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Quantize one sample. Out-of-range input saturates at the i16 bounds.
pub fn quantize(sample: f32) -> i16 {
    // `as` from float saturates, so 1.0 maps to i16::MAX rather than wrapping.
    (sample * PCM16_SCALE) as i16
}

pub fn dequantize(sample: i16) -> f32 {
    f32::from(sample) / PCM16_SCALE
}

/// f32 frame → s16le bytes.
pub fn f32_to_pcm16_le(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| quantize(s).to_le_bytes())
        .collect()
}

/// s16le bytes → f32 samples. A trailing odd byte is dropped.
pub fn pcm16_le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| dequantize(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// Raw f32le bytes (file microphone input) → samples.
pub fn f32_from_le_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Encode a captured frame as base64 s16le, ready for a realtime input
/// chunk.
pub fn encode_frame(samples: &[f32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(f32_to_pcm16_le(samples))
}

/// Build a playable buffer from decoded s16le bytes.
pub fn buffer_from_pcm16(bytes: &[u8], sample_rate: u32) -> PcmBuffer {
    PcmBuffer::new(pcm16_le_to_f32(bytes), sample_rate)
}
