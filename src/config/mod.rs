//! Configuration management for speak-selection
//!
//! Settings are layered, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. `.env` file (loaded in `main`)
//! 3. Environment variables (`SPEAK_PROVIDER`, `SPEAK_VOICE`, `SPEAK_SPEED`,
//!    `SPEAK_MAX_CHARS`, `SPEAK_REGION`, `SPEAK_TEMP_DIR`, `SPEAK_PLAYER`, ...)
//! 4. YAML file (`--config FILE` or `~/.config/speak-selection/config.yaml`)
//! 5. Command-line flags
//!
//! Speed is clamped into the supported range once all layers are applied.
//!
//! # Example
//! ```rust,no_run
//! use speak_selection::config::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load(None)?;
//! println!("Reading with {}", settings.provider);
//! # Ok(())
//! # }
//! ```

mod env;
mod merge;
mod yaml;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::tts::{BackendConfig, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED, ProviderId};

pub use yaml::YamlConfig;

/// Default bound on selection length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 4096;

/// Settings loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unknown provider '{0}'; expected openai, elevenlabs, azure or local")]
    UnknownProvider(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Effective application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub provider: ProviderId,
    /// Voice; the provider default applies when absent
    pub voice: Option<String>,
    pub speed: f32,
    pub max_chars: usize,
    /// Azure region
    pub region: Option<String>,
    pub model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub endpoints: HashMap<ProviderId, String>,
    pub temp_dir: PathBuf,
    /// Player binary name or path
    pub player: Option<String>,
    /// Credential store location; the per-user default applies when absent
    pub credentials_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderId::default(),
            voice: None,
            speed: DEFAULT_SPEED,
            max_chars: DEFAULT_MAX_CHARS,
            region: None,
            model: None,
            request_timeout_secs: None,
            endpoints: HashMap::new(),
            temp_dir: std::env::temp_dir(),
            player: None,
            credentials_path: None,
        }
    }
}

/// Command-line overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub provider: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub max_chars: Option<usize>,
}

impl Settings {
    /// Defaults plus environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(env::settings_from_lookup(|key| std::env::var(key).ok())?.finalize())
    }

    /// Environment plus a YAML file, which wins.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let base = env::settings_from_lookup(|key| std::env::var(key).ok())?;
        let yaml = YamlConfig::from_file(path)?;
        Ok(merge::apply_yaml(base, yaml)?.finalize())
    }

    /// Load from an explicit file, or from the per-user file when it exists,
    /// or from the environment alone.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration");
            return Self::from_file(path);
        }

        match Self::default_config_path() {
            Some(default) if default.exists() => {
                debug!(path = %default.display(), "Loading per-user configuration");
                Self::from_file(&default)
            }
            _ => Self::from_env(),
        }
    }

    /// `~/.config/speak-selection/config.yaml` (platform equivalent).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("speak-selection").join("config.yaml"))
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        if let Some(provider) = overrides.provider {
            self.provider = env::parse_provider(&provider)?;
        }
        if let Some(voice) = overrides.voice {
            self.voice = Some(voice);
        }
        if let Some(speed) = overrides.speed {
            self.speed = env::parse_speed("--speed", &speed.to_string())?;
        }
        if let Some(max) = overrides.max_chars {
            self.max_chars = env::parse_max_chars("--max-chars", &max.to_string())?;
        }
        Ok(self.finalize())
    }

    fn finalize(mut self) -> Self {
        let clamped = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        if clamped != self.speed {
            warn!(
                requested = self.speed,
                applied = clamped,
                "Speed outside supported range, clamping"
            );
            self.speed = clamped;
        }
        self
    }

    /// Voice to request: the configured one or the provider's default.
    pub fn effective_voice(&self) -> String {
        self.voice
            .clone()
            .unwrap_or_else(|| self.provider.default_voice().to_string())
    }

    /// Backend settings shared by every synthesis call.
    pub fn backend_defaults(&self) -> BackendConfig {
        BackendConfig {
            credential: None,
            region: self.region.clone(),
            endpoint: None,
            model: self.model.clone(),
            request_timeout: self.request_timeout_secs,
        }
    }
}
