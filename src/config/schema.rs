use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini API key. Usually supplied through `GEMINI_API_KEY`.
    pub api_key: Option<String>,
    pub gateway: GatewayConfig,
    pub voice: VoiceConfig,
    pub location: LocationConfig,
    pub scene: SceneConfig,
}

impl Config {
    /// Reject values that would make a subsystem unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.voice.frame_size == 0 {
            anyhow::bail!("voice.frame_size must be greater than zero");
        }
        if self.voice.input_sample_rate == 0 || self.voice.output_sample_rate == 0 {
            anyhow::bail!("voice sample rates must be greater than zero");
        }
        if self.gateway.request_timeout_secs == 0 {
            anyhow::bail!("gateway.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

// ── Gateway ──────────────────────────────────────────────────────

/// Request/response AI backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the Generative Language REST API.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    pub models: ModelConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 60,
            models: ModelConfig::default(),
        }
    }
}

/// Model used by each gateway operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub advice: String,
    pub lens: String,
    pub itinerary: String,
    pub suggestions: String,
    pub safety: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            advice: "gemini-2.5-flash".to_string(),
            lens: "gemini-2.5-flash-image".to_string(),
            itinerary: "gemini-3-flash-preview".to_string(),
            suggestions: "gemini-3-flash-preview".to_string(),
            safety: "gemini-3-flash-preview".to_string(),
        }
    }
}

// ── Voice ────────────────────────────────────────────────────────

/// Live voice guide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Gemini Live WebSocket endpoint.
    pub live_url: String,
    pub model: String,
    /// Prebuilt voice name.
    pub voice_name: String,
    /// Microphone capture rate (Hz).
    pub input_sample_rate: u32,
    /// Rate of audio returned by the model (Hz).
    pub output_sample_rate: u32,
    /// Samples per captured frame.
    pub frame_size: usize,
    /// Seconds to wait for `setupComplete` after connecting.
    pub setup_timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            live_url: "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent".to_string(),
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice_name: "Kore".to_string(),
            input_sample_rate: 16_000,
            output_sample_rate: 24_000,
            frame_size: 4096,
            setup_timeout_secs: 15,
        }
    }
}

// ── Location ─────────────────────────────────────────────────────

/// Geolocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Upper bound on a single position fetch.
    pub geolocation_timeout_secs: u64,
    /// Position reported by the CLI geolocator. `None` means no position
    /// is available (the permission-denied path).
    pub fixed: Option<FixedLocation>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geolocation_timeout_secs: 10,
            fixed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixedLocation {
    pub latitude: f64,
    pub longitude: f64,
}

// ── Scene ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub default_destination: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default_destination: crate::scene::DEFAULT_DESTINATION.to_string(),
        }
    }
}
