//! Azure Speech backend.
//!
//! Region scoped: the synthesis host is derived from the configured region
//! (`eastus` by default). Speed is expressed as an SSML prosody percentage.

mod config;
mod provider;

pub use config::{AzureAudioEncoding, DEFAULT_REGION, DEFAULT_VOICE};
pub use provider::{AZURE_TTS_URL, AzureTTS};
