//! OpenAI text-to-speech backend.
//!
//! # Supported Models
//!
//! - `tts-1` - Standard quality, lower latency
//! - `tts-1-hd` - High definition quality, higher latency
//! - `gpt-4o-mini-tts`
//!
//! # Supported Voices
//!
//! alloy, ash, ballad, coral, echo, fable, onyx, nova, sage, shimmer, verse
//!
//! # Example
//!
//! ```rust,ignore
//! use speak_selection::core::credentials::Credential;
//! use speak_selection::core::tts::{BackendConfig, OpenAITTS, SynthesisBackend, SynthesisRequest};
//!
//! let tts = OpenAITTS::new(&BackendConfig::with_credential(Credential::new("sk-...")))?;
//! let request = SynthesisRequest::new("Hello, world!", "nova", 1.0, 4096)?;
//! let mp3 = tts.synthesize(&request).await?;
//! ```

mod config;
mod provider;

pub use config::{AudioOutputFormat, OpenAITTSModel, OpenAIVoice};
pub use provider::{OPENAI_TTS_URL, OpenAITTS};
