//! ElevenLabs backend.
//!
//! - Endpoint: `POST https://api.elevenlabs.io/v1/text-to-speech/{voice_id}`
//! - Auth: `xi-api-key: <key>`
//! - Speed: `voice_settings.speed`, clamped to 0.7 to 1.2

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use super::config::{DEFAULT_VOICE_ID, ElevenLabsModel, OUTPUT_FORMAT, VoiceSettings};
use crate::core::credentials::Credential;
use crate::core::tts::base::{
    BackendConfig, ProviderId, SynthesisBackend, SynthesisRequest, TTSResult,
};
use crate::core::tts::provider::{HttpSynthesizer, TTSRequestBuilder};
use crate::core::tts::rate::elevenlabs_speed;

/// Base URL; the voice id is appended as a path segment.
pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

#[derive(Debug, Clone)]
struct ElevenLabsRequestBuilder {
    base_url: String,
    api_key: Credential,
    model: ElevenLabsModel,
}

impl ElevenLabsRequestBuilder {
    fn url_for(&self, request: &SynthesisRequest) -> String {
        let voice = match request.voice().trim() {
            "" => DEFAULT_VOICE_ID,
            v => v,
        };
        format!(
            "{}/{}?output_format={}",
            self.base_url.trim_end_matches('/'),
            voice,
            OUTPUT_FORMAT
        )
    }

    fn body(&self, request: &SynthesisRequest) -> serde_json::Value {
        let settings = VoiceSettings {
            speed: elevenlabs_speed(request.speed()),
            ..Default::default()
        };
        json!({
            "text": request.text(),
            "model_id": self.model.as_str(),
            "voice_settings": settings,
        })
    }
}

impl TTSRequestBuilder for ElevenLabsRequestBuilder {
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder {
        client
            .post(self.url_for(request))
            .header("xi-api-key", self.api_key.expose())
            .header("Content-Type", "application/json")
            .header("Accept", "audio/mpeg")
            .json(&self.body(request))
    }
}

/// Backend for the ElevenLabs text-to-speech API.
pub struct ElevenLabsTTS {
    http: HttpSynthesizer,
    request_builder: ElevenLabsRequestBuilder,
}

impl ElevenLabsTTS {
    pub fn new(config: &BackendConfig) -> TTSResult<Self> {
        let api_key = config.require_credential(ProviderId::ElevenLabs)?.clone();

        let request_builder = ElevenLabsRequestBuilder {
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| ELEVENLABS_TTS_URL.to_string()),
            api_key,
            model: config
                .model
                .as_deref()
                .map(ElevenLabsModel::from_str_or_default)
                .unwrap_or_default(),
        };

        Ok(Self {
            http: HttpSynthesizer::new(ProviderId::ElevenLabs, config)?,
            request_builder,
        })
    }
}

#[async_trait]
impl SynthesisBackend for ElevenLabsTTS {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        self.http.execute(&self.request_builder, request).await
    }

    fn provider(&self) -> ProviderId {
        ProviderId::ElevenLabs
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "elevenlabs",
            "api_type": "HTTP REST",
            "model": self.request_builder.model.as_str(),
            "output_format": OUTPUT_FORMAT,
            "default_voice": DEFAULT_VOICE_ID,
            "speed_range": { "min": 0.7, "max": 1.2, "default": 1.0 },
            "endpoint": self.request_builder.base_url,
        })
    }
}
