//! Azure Speech backend.
//!
//! - Endpoint: `POST https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Auth: `Ocp-Apim-Subscription-Key: <key>`
//! - Body: SSML with a `<prosody rate="+N%">` wrapper

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use super::config::{
    AzureAudioEncoding, DEFAULT_REGION, DEFAULT_VOICE, region_endpoint, validate_region,
    voice_locale,
};
use crate::core::credentials::Credential;
use crate::core::tts::base::{
    BackendConfig, ProviderId, SynthesisBackend, SynthesisRequest, TTSResult,
};
use crate::core::tts::provider::{HttpSynthesizer, TTSRequestBuilder, escape_xml};
use crate::core::tts::rate::azure_rate_attr;

/// Endpoint template; `{region}` is substituted at construction.
pub const AZURE_TTS_URL: &str = "https://{region}.tts.speech.microsoft.com/cognitiveservices/v1";

#[derive(Debug, Clone)]
struct AzureRequestBuilder {
    url: String,
    subscription_key: Credential,
    encoding: AzureAudioEncoding,
}

impl AzureRequestBuilder {
    /// Build the SSML document for a request.
    fn ssml(&self, request: &SynthesisRequest) -> String {
        let voice = match request.voice().trim() {
            "" => DEFAULT_VOICE,
            v => v,
        };
        format!(
            "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"{}\"><voice name=\"{}\"><prosody rate=\"{}\">{}</prosody></voice></speak>",
            voice_locale(voice),
            escape_xml(voice),
            azure_rate_attr(request.speed()),
            escape_xml(request.text())
        )
    }
}

impl TTSRequestBuilder for AzureRequestBuilder {
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder {
        client
            .post(&self.url)
            .header("Ocp-Apim-Subscription-Key", self.subscription_key.expose())
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", self.encoding.as_str())
            .body(self.ssml(request))
    }
}

/// Backend for Azure Speech.
pub struct AzureTTS {
    http: HttpSynthesizer,
    request_builder: AzureRequestBuilder,
    region: String,
}

impl AzureTTS {
    pub fn new(config: &BackendConfig) -> TTSResult<Self> {
        let subscription_key = config.require_credential(ProviderId::Azure)?.clone();
        let region = validate_region(config.region.as_deref().unwrap_or(DEFAULT_REGION))?;

        let url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| region_endpoint(&region));

        Ok(Self {
            http: HttpSynthesizer::new(ProviderId::Azure, config)?,
            request_builder: AzureRequestBuilder {
                url,
                subscription_key,
                encoding: AzureAudioEncoding::default(),
            },
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &str {
        &self.request_builder.url
    }
}

#[async_trait]
impl SynthesisBackend for AzureTTS {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        self.http.execute(&self.request_builder, request).await
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Azure
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "azure",
            "api_type": "HTTP REST (SSML)",
            "region": self.region,
            "output_format": self.request_builder.encoding.as_str(),
            "default_voice": DEFAULT_VOICE,
            "rate_range_percent": { "min": -50, "max": 100, "default": 0 },
            "endpoint": self.request_builder.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BackendConfig {
        BackendConfig::with_credential(Credential::new("azure-key"))
    }

    #[test]
    fn test_default_region() {
        let tts = AzureTTS::new(&config()).unwrap();
        assert_eq!(tts.region(), "eastus");
        assert_eq!(
            tts.endpoint(),
            "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
        );
    }

    #[test]
    fn test_invalid_region_rejected() {
        let mut config = config();
        config.region = Some("not a region".into());
        assert!(AzureTTS::new(&config).is_err());
    }

    #[test]
    fn test_ssml_escapes_text_and_sets_rate() {
        let tts = AzureTTS::new(&config()).unwrap();
        let request =
            SynthesisRequest::new("Fish & <chips>", "en-GB-SoniaNeural", 1.25, 100).unwrap();
        let ssml = tts.request_builder.ssml(&request);

        assert!(ssml.contains("xml:lang=\"en-GB\""));
        assert!(ssml.contains("<voice name=\"en-GB-SoniaNeural\">"));
        assert!(ssml.contains("<prosody rate=\"+25%\">"));
        assert!(ssml.contains("Fish &amp; &lt;chips&gt;"));
    }

    #[test]
    fn test_identity_rate() {
        let tts = AzureTTS::new(&config()).unwrap();
        let request = SynthesisRequest::new("Hi", "", 1.0, 100).unwrap();
        let ssml = tts.request_builder.ssml(&request);
        assert!(ssml.contains("rate=\"+0%\""));
        assert!(ssml.contains(DEFAULT_VOICE));
    }

    #[test]
    fn test_headers() {
        let tts = AzureTTS::new(&config()).unwrap();
        let request = SynthesisRequest::new("Hi", "", 1.0, 100).unwrap();
        let built = tts
            .request_builder
            .build_http_request(&reqwest::Client::new(), &request)
            .build()
            .unwrap();

        assert_eq!(
            built.headers().get("Ocp-Apim-Subscription-Key").unwrap(),
            "azure-key"
        );
        assert_eq!(
            built.headers().get("Content-Type").unwrap(),
            "application/ssml+xml"
        );
    }
}
