pub mod azure;
mod base;
pub mod elevenlabs;
pub mod local;
pub mod openai;
pub mod provider;
pub mod rate;

pub use azure::{AZURE_TTS_URL, AzureAudioEncoding, AzureTTS};
pub use base::{
    AudioContainer, BackendConfig, BoxedBackend, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED, ProviderId,
    SynthesisBackend, SynthesisRequest, TTSError, TTSResult, ValidationError,
};
pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsTTS};
pub use local::{LocalEngine, LocalTTS};
pub use openai::{AudioOutputFormat, OPENAI_TTS_URL, OpenAITTS, OpenAITTSModel, OpenAIVoice};
pub use provider::{HttpSynthesizer, TTSRequestBuilder, classify_http_failure};

use std::collections::HashMap;

/// Builds a backend for a provider on demand.
///
/// The orchestrator builds a fresh backend per attempt so a re-entered
/// credential takes effect immediately.
pub trait BackendFactory: Send + Sync {
    fn create(&self, provider: ProviderId, config: BackendConfig) -> TTSResult<BoxedBackend>;
}

/// Maps each [`ProviderId`] to its backend implementation.
///
/// Endpoint overrides registered here are applied to every backend built for
/// that provider unless the config already carries one.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    endpoints: HashMap<ProviderId, String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point a provider at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, provider: ProviderId, url: impl Into<String>) -> Self {
        self.endpoints.insert(provider, url.into());
        self
    }

    pub fn with_endpoints(mut self, endpoints: &HashMap<ProviderId, String>) -> Self {
        self.endpoints
            .extend(endpoints.iter().map(|(p, url)| (*p, url.clone())));
        self
    }

    pub fn endpoint(&self, provider: ProviderId) -> Option<&str> {
        self.endpoints.get(&provider).map(String::as_str)
    }

    /// Build the backend for `provider`.
    pub fn resolve(&self, provider: ProviderId, mut config: BackendConfig) -> TTSResult<BoxedBackend> {
        if config.endpoint.is_none() {
            config.endpoint = self.endpoints.get(&provider).cloned();
        }

        match provider {
            ProviderId::OpenAI => Ok(Box::new(OpenAITTS::new(&config)?)),
            ProviderId::ElevenLabs => Ok(Box::new(ElevenLabsTTS::new(&config)?)),
            ProviderId::Azure => Ok(Box::new(AzureTTS::new(&config)?)),
            ProviderId::Local => Ok(Box::new(LocalTTS::new(&config)?)),
        }
    }
}

impl BackendFactory for ProviderRegistry {
    fn create(&self, provider: ProviderId, config: BackendConfig) -> TTSResult<BoxedBackend> {
        self.resolve(provider, config)
    }
}

/// Factory function to create a backend from a provider name.
///
/// # Supported Providers
///
/// - `"openai"` - OpenAI Audio Speech API
/// - `"elevenlabs"` or `"eleven-labs"` - ElevenLabs API
/// - `"azure"` or `"microsoft-azure"` - Azure Speech (region scoped)
/// - `"local"`, `"system"` or `"native"` - OS speech engine
pub fn create_tts_provider(provider_type: &str, config: BackendConfig) -> TTSResult<BoxedBackend> {
    let provider: ProviderId = provider_type.parse()?;
    ProviderRegistry::new().resolve(provider, config)
}

/// Returns a map of provider names to their default API endpoint URLs.
///
/// Azure uses regional endpoints; the value is a `{region}` template.
pub fn get_tts_provider_urls() -> HashMap<String, String> {
    let mut urls = HashMap::new();
    urls.insert("openai".to_string(), OPENAI_TTS_URL.to_string());
    urls.insert("elevenlabs".to_string(), ELEVENLABS_TTS_URL.to_string());
    urls.insert("azure".to_string(), AZURE_TTS_URL.to_string());
    urls
}
