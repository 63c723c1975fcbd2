//! ElevenLabs text-to-speech backend.
//!
//! Voices are addressed by id; the settings `voice` value is used verbatim as
//! the path segment, defaulting to "Rachel".

mod config;
mod provider;

pub use config::{DEFAULT_VOICE_ID, ElevenLabsModel, VoiceSettings};
pub use provider::{ELEVENLABS_TTS_URL, ElevenLabsTTS};
