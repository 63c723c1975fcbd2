use std::path::PathBuf;

use super::env::{parse_max_chars, parse_provider};
use super::yaml::YamlConfig;
use super::{ConfigError, Settings};

/// Overlay YAML values onto environment-derived settings.
pub(crate) fn apply_yaml(mut settings: Settings, yaml: YamlConfig) -> Result<Settings, ConfigError> {
    if let Some(speech) = yaml.speech {
        if let Some(provider) = speech.provider {
            settings.provider = parse_provider(&provider)?;
        }
        if let Some(voice) = speech.voice.filter(|v| !v.trim().is_empty()) {
            settings.voice = Some(voice);
        }
        if let Some(speed) = speech.speed {
            if !speed.is_finite() {
                return Err(ConfigError::Invalid {
                    key: "speech.speed".into(),
                    message: "must be a finite number".into(),
                });
            }
            settings.speed = speed;
        }
        if let Some(max) = speech.max_chars {
            settings.max_chars = parse_max_chars("speech.max_chars", &max.to_string())?;
        }
    }

    if let Some(providers) = yaml.providers {
        if providers.azure_region.is_some() {
            settings.region = providers.azure_region;
        }
        if providers.model.is_some() {
            settings.model = providers.model;
        }
        if providers.request_timeout_seconds.is_some() {
            settings.request_timeout_secs = providers.request_timeout_seconds;
        }
        for (name, url) in providers.endpoints {
            let provider = parse_provider(&name)?;
            settings.endpoints.insert(provider, url);
        }
    }

    if let Some(playback) = yaml.playback {
        if playback.player.is_some() {
            settings.player = playback.player;
        }
        if let Some(dir) = playback.temp_dir {
            settings.temp_dir = PathBuf::from(dir);
        }
    }

    if let Some(path) = yaml.credentials.and_then(|c| c.path) {
        settings.credentials_path = Some(PathBuf::from(path));
    }

    Ok(settings)
}
