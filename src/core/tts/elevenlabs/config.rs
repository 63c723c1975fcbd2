//! Configuration types for the ElevenLabs text-to-speech API.

use serde::{Deserialize, Serialize};

/// Default voice ("Rachel").
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Supported ElevenLabs models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevenLabsModel {
    #[default]
    #[serde(rename = "eleven_multilingual_v2")]
    MultilingualV2,
    #[serde(rename = "eleven_turbo_v2_5")]
    TurboV2_5,
    #[serde(rename = "eleven_flash_v2_5")]
    FlashV2_5,
}

impl ElevenLabsModel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultilingualV2 => "eleven_multilingual_v2",
            Self::TurboV2_5 => "eleven_turbo_v2_5",
            Self::FlashV2_5 => "eleven_flash_v2_5",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "eleven_turbo_v2_5" | "turbo" => Self::TurboV2_5,
            "eleven_flash_v2_5" | "flash" => Self::FlashV2_5,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for ElevenLabsModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `output_format` query parameter; always an MP3 container.
pub const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// `voice_settings` request object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            speed: 1.0,
        }
    }
}
