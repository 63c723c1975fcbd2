use std::path::PathBuf;

use super::{ConfigError, Settings};
use crate::core::tts::ProviderId;

/// Build settings from defaults plus environment variables.
///
/// `lookup` abstracts the process environment so tests need not mutate it.
pub(crate) fn settings_from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let mut settings = Settings::default();

    if let Some(provider) = get("SPEAK_PROVIDER") {
        settings.provider = parse_provider(&provider)?;
    }
    settings.voice = get("SPEAK_VOICE");
    if let Some(speed) = get("SPEAK_SPEED") {
        settings.speed = parse_speed("SPEAK_SPEED", &speed)?;
    }
    if let Some(max) = get("SPEAK_MAX_CHARS") {
        settings.max_chars = parse_max_chars("SPEAK_MAX_CHARS", &max)?;
    }
    settings.region = get("SPEAK_REGION").or_else(|| get("AZURE_SPEECH_REGION"));
    settings.model = get("SPEAK_MODEL");
    if let Some(dir) = get("SPEAK_TEMP_DIR") {
        settings.temp_dir = PathBuf::from(dir);
    }
    settings.player = get("SPEAK_PLAYER");
    if let Some(path) = get("SPEAK_CREDENTIALS_FILE") {
        settings.credentials_path = Some(PathBuf::from(path));
    }

    Ok(settings)
}

pub(crate) fn parse_provider(value: &str) -> Result<ProviderId, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::UnknownProvider(value.to_string()))
}

pub(crate) fn parse_speed(key: &str, value: &str) -> Result<f32, ConfigError> {
    let speed: f32 = value.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("'{value}' is not a number"),
    })?;
    if !speed.is_finite() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            message: format!("'{value}' is not a finite number"),
        });
    }
    Ok(speed)
}

pub(crate) fn parse_max_chars(key: &str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid {
            key: key.to_string(),
            message: format!("'{value}' is not a positive integer"),
        }),
        Ok(n) => Ok(n),
    }
}
