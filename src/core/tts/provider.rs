//! Shared HTTP plumbing for request/response synthesis backends.
//!
//! Each HTTP backend supplies a [`TTSRequestBuilder`] that knows its vendor's
//! URL, headers and body. [`HttpSynthesizer`] sends the request, classifies
//! failures into [`TTSError`] variants and rejects empty audio bodies.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{debug, error};

use super::base::{BackendConfig, ProviderId, SynthesisRequest, TTSError, TTSResult};

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Connection establishment timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Longest vendor error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Builds the vendor-specific HTTP request for one synthesis call.
pub trait TTSRequestBuilder: Send + Sync {
    fn build_http_request(
        &self,
        client: &reqwest::Client,
        request: &SynthesisRequest,
    ) -> reqwest::RequestBuilder;
}

/// Sends built requests and turns responses into audio or classified errors.
#[derive(Debug, Clone)]
pub struct HttpSynthesizer {
    client: reqwest::Client,
    provider: ProviderId,
}

impl HttpSynthesizer {
    pub fn new(provider: ProviderId, config: &BackendConfig) -> TTSResult<Self> {
        let timeout = config
            .request_timeout
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(timeout))
            .user_agent(concat!("speak-selection/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                TTSError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, provider })
    }

    /// Execute one synthesis call.
    pub async fn execute(
        &self,
        builder: &dyn TTSRequestBuilder,
        request: &SynthesisRequest,
    ) -> TTSResult<Bytes> {
        debug!(
            provider = %self.provider,
            text_len = request.text().chars().count(),
            voice = request.voice(),
            speed = request.speed(),
            "Sending synthesis request"
        );

        let response = builder
            .build_http_request(&self.client, request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = %self.provider, error = %e, "Synthesis request failed");
                TTSError::NetworkError(format!("Request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                provider = %self.provider,
                status = %status,
                "Synthesis API returned error"
            );
            return Err(classify_http_failure(status, &body));
        }

        let audio = response.bytes().await.map_err(|e| {
            error!(provider = %self.provider, error = %e, "Failed to read audio response");
            TTSError::NetworkError(format!("Failed to read audio: {e}"))
        })?;

        if audio.is_empty() {
            return Err(TTSError::AudioGenerationFailed(format!(
                "{} returned an empty audio body",
                self.provider.display_name()
            )));
        }

        debug!(
            provider = %self.provider,
            audio_bytes = audio.len(),
            "Successfully synthesized audio"
        );

        Ok(audio)
    }
}

/// Map a non-success HTTP response to a [`TTSError`].
///
/// 401 and 403 are authentication failures. Everything else, including 429
/// and 5xx, is a provider error and never leads to a credential prompt.
pub fn classify_http_failure(status: StatusCode, body: &str) -> TTSError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no details").to_string());
    let code = status.as_u16();

    match code {
        401 | 403 => TTSError::AuthenticationFailed {
            status: code,
            message,
        },
        429 => TTSError::ProviderError {
            status: code,
            message: format!("Rate limit or quota exceeded: {message}"),
        },
        500..=599 => TTSError::ProviderError {
            status: code,
            message: format!("Server error: {message}"),
        },
        _ => TTSError::ProviderError {
            status: code,
            message,
        },
    }
}

/// Pull a human-readable message out of a vendor error body.
///
/// Understands `{"error": {"message": ..}}`, `{"detail": {"message": ..}}`,
/// `{"detail": ".."}`, `{"message": ..}` and `{"error": ".."}`; falls back
/// to the raw body.
fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let candidates = [
            value.pointer("/error/message"),
            value.pointer("/detail/message"),
            value.get("detail"),
            value.get("message"),
            value.get("error"),
        ];
        if let Some(text) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return Some(truncate(text));
        }
    }

    Some(truncate(trimmed))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        cut.push_str("...");
        cut
    }
}

/// Escape text for inclusion in an XML/SSML document.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
