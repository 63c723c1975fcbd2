use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional; anything missing keeps the value from the
/// environment or the built-in default.
///
/// # Example YAML structure
/// ```yaml
/// speech:
///   provider: "azure"
///   voice: "en-GB-SoniaNeural"
///   speed: 1.25
///   max_chars: 4096
///
/// providers:
///   azure_region: "westeurope"
///   model: "tts-1-hd"
///   request_timeout_seconds: 30
///   endpoints:
///     openai: "http://localhost:8080/v1/audio/speech"
///
/// playback:
///   player: "mpg123"
///   temp_dir: "/tmp/speak-selection"
///
/// credentials:
///   path: "/home/me/.config/speak-selection/credentials.yaml"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub speech: Option<SpeechYaml>,
    pub providers: Option<ProvidersYaml>,
    pub playback: Option<PlaybackYaml>,
    pub credentials: Option<CredentialsYaml>,
}

/// What to say and how
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    pub provider: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub max_chars: Option<usize>,
}

/// Provider connection settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    /// Azure region where the Speech resource is deployed (e.g., "eastus")
    pub azure_region: Option<String>,
    pub model: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    /// Endpoint overrides keyed by provider name
    pub endpoints: HashMap<String, String>,
}

/// Playback settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PlaybackYaml {
    pub player: Option<String>,
    pub temp_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsYaml {
    pub path: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
