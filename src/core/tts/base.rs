//! Base traits and types for speech-synthesis backends.
//!
//! Every backend implements [`SynthesisBackend`], a capability interface with a
//! single operation: turn a validated [`SynthesisRequest`] into audio bytes
//! (an MP3 or WAV container). Backends are selected by an explicit
//! [`ProviderId`], never by runtime type inspection.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::credentials::Credential;

/// Slowest normalized speaking speed.
pub const MIN_SPEED: f32 = 0.25;

/// Fastest normalized speaking speed.
pub const MAX_SPEED: f32 = 4.0;

/// Normalized speed meaning "no change".
pub const DEFAULT_SPEED: f32 = 1.0;

// =============================================================================
// Error Types
// =============================================================================

/// Errors a backend can return from a synthesis call.
#[derive(Debug, Error)]
pub enum TTSError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, reset)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider rejected the credential (HTTP 401/403)
    #[error("Authentication failed (HTTP {status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    /// Quota exhaustion, rate limiting or a server-side failure
    #[error("Provider error (HTTP {status}): {message}")]
    ProviderError { status: u16, message: String },

    /// The backend cannot be built from the given settings
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A local speech engine failed or is not installed
    #[error("Speech engine error: {0}")]
    EngineError(String),

    /// The provider answered successfully but produced no usable audio
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),
}

impl TTSError {
    /// HTTP status attached to the failure, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } | Self::ProviderError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Result type for backend operations.
pub type TTSResult<T> = Result<T, TTSError>;

/// Rejections raised while building a [`SynthesisRequest`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No text selected")]
    EmptyText,

    #[error("Selection is {len} characters long; the limit is {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("Speed {0} is outside the supported range 0.25 to 4.0")]
    SpeedOutOfRange(f32),
}

// =============================================================================
// Provider Identity
// =============================================================================

/// The closed set of synthesis providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// OpenAI Audio Speech API
    #[default]
    OpenAI,
    /// ElevenLabs text-to-speech API
    ElevenLabs,
    /// Microsoft Azure Speech (region scoped)
    Azure,
    /// OS-native speech engine, needs no credential
    Local,
}

impl ProviderId {
    /// Canonical settings name.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::ElevenLabs => "elevenlabs",
            Self::Azure => "azure",
            Self::Local => "local",
        }
    }

    /// Whether a credential must be supplied before synthesis.
    #[inline]
    pub fn requires_credential(&self) -> bool {
        !matches!(self, Self::Local)
    }

    /// Environment variable consulted (read-only) when no credential is stored.
    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::ElevenLabs => Some("ELEVENLABS_API_KEY"),
            Self::Azure => Some("AZURE_SPEECH_KEY"),
            Self::Local => None,
        }
    }

    /// Voice used when the settings do not name one.
    pub fn default_voice(&self) -> &'static str {
        match self {
            Self::OpenAI => "alloy",
            // "Rachel"
            Self::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
            Self::Azure => "en-US-JennyNeural",
            Self::Local => "",
        }
    }

    /// Human-readable provider name for prompts and messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::ElevenLabs => "ElevenLabs",
            Self::Azure => "Azure Speech",
            Self::Local => "Local speech engine",
        }
    }

    /// All providers, in the order they are listed to users.
    pub fn all() -> &'static [ProviderId] {
        &[Self::OpenAI, Self::ElevenLabs, Self::Azure, Self::Local]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = TTSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open-ai" => Ok(Self::OpenAI),
            "elevenlabs" | "eleven-labs" | "eleven_labs" => Ok(Self::ElevenLabs),
            "azure" | "microsoft-azure" | "azure-speech" => Ok(Self::Azure),
            "local" | "system" | "native" => Ok(Self::Local),
            _ => Err(TTSError::InvalidConfiguration(format!(
                "Unsupported TTS provider: {s}. Supported providers: openai, elevenlabs, azure, local"
            ))),
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// One validated unit of text to synthesize. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    text: String,
    voice: String,
    speed: f32,
}

impl SynthesisRequest {
    /// Validate and build a request.
    ///
    /// `max_chars` bounds the text length in Unicode scalar values.
    /// Whitespace-only text is treated as empty.
    pub fn new(
        text: impl Into<String>,
        voice: impl Into<String>,
        speed: f32,
        max_chars: usize,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let len = text.chars().count();
        if len > max_chars {
            return Err(ValidationError::TextTooLong {
                len,
                max: max_chars,
            });
        }

        // NaN fails the range check as well
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(ValidationError::SpeedOutOfRange(speed));
        }

        Ok(Self {
            text,
            voice: voice.into(),
            speed,
        })
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn voice(&self) -> &str {
        &self.voice
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }
}

// =============================================================================
// Audio Container
// =============================================================================

/// Container format of synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    #[default]
    Mp3,
    Wav,
}

impl AudioContainer {
    /// Detect the container from the leading bytes. Anything that is not a
    /// RIFF/WAVE header is treated as MP3.
    pub fn sniff(audio: &[u8]) -> Self {
        if audio.len() >= 12 && &audio[0..4] == b"RIFF" && &audio[8..12] == b"WAVE" {
            Self::Wav
        } else {
            Self::Mp3
        }
    }

    #[inline]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    #[inline]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }
}

// =============================================================================
// Backend Contract
// =============================================================================

/// Settings handed to a backend when it is built.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    /// Credential for providers that need one
    pub credential: Option<Credential>,
    /// Region for region-scoped providers (Azure)
    pub region: Option<String>,
    /// Endpoint override (full URL; ElevenLabs takes the base before `/{voice_id}`)
    pub endpoint: Option<String>,
    /// Provider model override
    pub model: Option<String>,
    /// Request timeout in seconds
    pub request_timeout: Option<u64>,
}

impl BackendConfig {
    /// Build a config carrying only a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
            ..Default::default()
        }
    }

    /// The credential, or a configuration error naming the provider.
    pub(crate) fn require_credential(&self, provider: ProviderId) -> TTSResult<&Credential> {
        self.credential
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                TTSError::InvalidConfiguration(format!(
                    "{} requires a credential",
                    provider.display_name()
                ))
            })
    }
}

/// A speech-synthesis backend.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Synthesize the request into an audio container (MP3 or WAV).
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes>;

    /// Which provider this backend talks to.
    fn provider(&self) -> ProviderId;

    /// Static description of the backend for diagnostics.
    fn get_provider_info(&self) -> serde_json::Value;
}

/// Boxed backend as returned by the registry.
pub type BoxedBackend = Box<dyn SynthesisBackend>;
