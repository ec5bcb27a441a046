//! Runtime configuration for Nomad.
//!
//! Configuration is read from a TOML file (explicit `--config` path or the
//! platform config directory) and overlaid with environment variables for
//! the API key. A missing file is not an error: every section has defaults.

pub mod schema;

#[allow(unused_imports)]
pub use schema::{
    Config, FixedLocation, GatewayConfig, LocationConfig, ModelConfig, SceneConfig, VoiceConfig,
};

use anyhow::Context;
use std::path::{Path, PathBuf};

/// Environment variables checked (in order) for the Gemini API key.
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Default location of `config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "nomad").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from `path` (or the default location), then apply
/// environment overrides.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let resolved = path.map(Path::to_path_buf).or_else(default_config_path);

    let mut config = match resolved {
        Some(ref p) if p.exists() => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read config file {}", p.display()))?;
            let config = parse(&raw)
                .with_context(|| format!("Failed to parse config file {}", p.display()))?;
            tracing::debug!(path = %p.display(), "Loaded config file");
            config
        }
        Some(ref p) if path.is_some() => {
            anyhow::bail!("Config file not found: {}", p.display());
        }
        _ => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Parse a TOML document into a [`Config`].
pub fn parse(raw: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Overlay values taken from the environment. `lookup` is injected so tests
/// do not have to mutate the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for var in API_KEY_ENV_VARS {
        if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key.trim().to_string());
            return;
        }
    }
}
