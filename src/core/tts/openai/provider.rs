//! OpenAI backend.
//!
//! - Endpoint: `POST https://api.openai.com/v1/audio/speech`
//! - Auth: `Authorization: Bearer <key>`
//! - Speed: 0.25 to 4.0, sent only when it differs from 1.0

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use tracing::warn;

use super::config::{AudioOutputFormat, OpenAITTSModel, OpenAIVoice};
use crate::core::credentials::Credential;
use crate::core::tts::base::{
    BackendConfig, ProviderId, SynthesisBackend, SynthesisRequest, TTSResult,
};
use crate::core::tts::provider::{HttpSynthesizer, TTSRequestBuilder};
use crate::core::tts::rate::openai_speed;

/// OpenAI TTS API endpoint
pub const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

// =============================================================================
// Request Builder
// =============================================================================

#[derive(Debug, Clone)]
struct OpenAIRequestBuilder {
    url: String,
    api_key: Credential,
    model: OpenAITTSModel,
    response_format: AudioOutputFormat,
}

impl OpenAIRequestBuilder {
    fn voice_for(&self, request: &SynthesisRequest) -> OpenAIVoice {
        if request.voice().is_empty() {
            return OpenAIVoice::default();
        }
        OpenAIVoice::parse(request.voice()).unwrap_or_else(|| {
            warn!(
                voice = request.voice(),
                "Unknown OpenAI voice, falling back to default"
            );
            OpenAIVoice::default()
        })
    }

    fn body(&self, request: &SynthesisRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.model.as_str(),
            "input": request.text(),
            "voice": self.voice_for(request).as_str(),
            "response_format": self.response_format.as_str(),
        });

        let speed = openai_speed(request.speed());
        if (speed - 1.0).abs() > 0.001 {
            body["speed"] = json!(speed);
        }
        body
    }
}

impl TTSRequestBuilder for OpenAIRequestBuilder {
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder {
        client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&self.body(request))
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Backend for the OpenAI Audio Speech API.
pub struct OpenAITTS {
    http: HttpSynthesizer,
    request_builder: OpenAIRequestBuilder,
}

impl OpenAITTS {
    pub fn new(config: &BackendConfig) -> TTSResult<Self> {
        let api_key = config.require_credential(ProviderId::OpenAI)?.clone();

        let model = config
            .model
            .as_deref()
            .map(OpenAITTSModel::from_str_or_default)
            .unwrap_or_default();

        let request_builder = OpenAIRequestBuilder {
            url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| OPENAI_TTS_URL.to_string()),
            api_key,
            model,
            response_format: AudioOutputFormat::Mp3,
        };

        Ok(Self {
            http: HttpSynthesizer::new(ProviderId::OpenAI, config)?,
            request_builder,
        })
    }

    pub fn model(&self) -> OpenAITTSModel {
        self.request_builder.model
    }

    pub fn endpoint(&self) -> &str {
        &self.request_builder.url
    }
}

#[async_trait]
impl SynthesisBackend for OpenAITTS {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        self.http.execute(&self.request_builder, request).await
    }

    fn provider(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "openai",
            "api_type": "HTTP REST",
            "model": self.request_builder.model.as_str(),
            "output_format": self.request_builder.response_format.as_str(),
            "supported_voices": OpenAIVoice::all().iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            "speed_range": { "min": 0.25, "max": 4.0, "default": 1.0 },
            "endpoint": self.request_builder.url,
        })
    }
}
