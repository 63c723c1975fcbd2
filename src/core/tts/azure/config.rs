//! Configuration types for Azure Speech.

use serde::{Deserialize, Serialize};

use crate::core::tts::base::{TTSError, TTSResult};

/// Region used when the settings do not name one.
pub const DEFAULT_REGION: &str = "eastus";

/// Default neural voice.
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// Audio encodings requested through `X-Microsoft-OutputFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AzureAudioEncoding {
    #[default]
    #[serde(rename = "audio-24khz-48kbitrate-mono-mp3")]
    Mp3_24Khz48Kbps,
    #[serde(rename = "riff-24khz-16bit-mono-pcm")]
    Riff24Khz16Bit,
}

impl AzureAudioEncoding {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3_24Khz48Kbps => "audio-24khz-48kbitrate-mono-mp3",
            Self::Riff24Khz16Bit => "riff-24khz-16bit-mono-pcm",
        }
    }
}

impl std::fmt::Display for AzureAudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a region name before it becomes part of a hostname.
pub fn validate_region(region: &str) -> TTSResult<String> {
    let region = region.trim().to_lowercase();
    if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TTSError::InvalidConfiguration(format!(
            "Invalid Azure region '{region}': expected something like 'eastus' or 'westeurope'"
        )));
    }
    Ok(region)
}

/// Synthesis endpoint for a region.
pub fn region_endpoint(region: &str) -> String {
    format!("https://{region}.tts.speech.microsoft.com/cognitiveservices/v1")
}

/// Derive the `xml:lang` locale from a voice name like `en-GB-SoniaNeural`.
pub fn voice_locale(voice: &str) -> String {
    let mut parts = voice.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(lang), Some(country), Some(_)) if !lang.is_empty() && !country.is_empty() => {
            format!("{lang}-{country}")
        }
        _ => "en-US".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_validation() {
        assert_eq!(validate_region("WestEurope").unwrap(), "westeurope");
        assert!(validate_region("").is_err());
        assert!(validate_region("evil.com/x").is_err());
    }

    #[test]
    fn test_region_endpoint() {
        assert_eq!(
            region_endpoint("eastus"),
            "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[test]
    fn test_voice_locale() {
        assert_eq!(voice_locale("en-GB-SoniaNeural"), "en-GB");
        assert_eq!(voice_locale("de-DE-KatjaNeural"), "de-DE");
        assert_eq!(voice_locale("Jenny"), "en-US");
    }
}
