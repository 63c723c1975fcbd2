use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AuthSignature, SynthesisError, SynthesisOutcome};
use crate::core::credentials::{Credential, CredentialResolver};
use crate::core::tts::{BackendConfig, BackendFactory, ProviderId, SynthesisRequest, TTSError};

/// Network attempts per run: the first call plus one retry after re-entry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Runs one synthesis request end to end: credential lookup, prompting,
/// the backend call and at most one retry after an authentication failure.
///
/// The orchestrator holds no per-run state; concurrent runs only share the
/// credential store.
#[derive(Clone)]
pub struct SynthesisOrchestrator {
    backends: Arc<dyn BackendFactory>,
    credentials: CredentialResolver,
    signature: AuthSignature,
    defaults: BackendConfig,
}

impl SynthesisOrchestrator {
    pub fn new(backends: Arc<dyn BackendFactory>, credentials: CredentialResolver) -> Self {
        Self {
            backends,
            credentials,
            signature: AuthSignature::default(),
            defaults: BackendConfig::default(),
        }
    }

    /// Region, model and timeout applied to every backend built. Any
    /// credential in `defaults` is ignored.
    pub fn with_backend_defaults(mut self, mut defaults: BackendConfig) -> Self {
        defaults.credential = None;
        self.defaults = defaults;
        self
    }

    pub fn with_signature(mut self, signature: AuthSignature) -> Self {
        self.signature = signature;
        self
    }

    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    /// Synthesize `request` with `provider`.
    ///
    /// Cancellation is checked before every dispatch. A cancel signalled while
    /// a call is in flight drops the call and discards its result.
    pub async fn run(
        &self,
        request: &SynthesisRequest,
        provider: ProviderId,
        cancel: &CancellationToken,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        let mut credential = if self.credentials.needs_credential(provider) {
            match self.credentials.get(provider)? {
                Some(credential) => Some(credential),
                None => {
                    info!(provider = %provider, "No stored credential, prompting");
                    match self.credentials.prompt_and_store(provider).await? {
                        Some(credential) => Some(credential),
                        None => {
                            info!(provider = %provider, "Credential prompt cancelled");
                            return Ok(SynthesisOutcome::Cancelled);
                        }
                    }
                }
            }
        } else {
            None
        };

        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                info!(provider = %provider, attempt, "Synthesis cancelled before dispatch");
                return Ok(SynthesisOutcome::Cancelled);
            }

            let config = BackendConfig {
                credential: credential.clone(),
                ..self.defaults.clone()
            };
            let backend = self
                .backends
                .create(provider, config)
                .map_err(|e| self.surface(provider, e, false, credential.as_ref()))?;

            debug!(provider = %provider, attempt, "Dispatching synthesis request");
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(provider = %provider, attempt, "Synthesis cancelled in flight, discarding result");
                    return Ok(SynthesisOutcome::Cancelled);
                }
                result = backend.synthesize(request) => result,
            };

            let error = match result {
                Ok(audio) => {
                    info!(provider = %provider, attempt, audio_bytes = audio.len(), "Synthesis complete");
                    return Ok(SynthesisOutcome::Audio(audio));
                }
                Err(error) => error,
            };

            let auth_failure = self.signature.matches_error(&error);
            warn!(
                provider = %provider,
                attempt,
                auth_failure,
                error = %scrub(&error.to_string(), credential.as_ref()),
                "Synthesis attempt failed"
            );

            if !auth_failure
                || attempt >= MAX_ATTEMPTS
                || !self.credentials.needs_credential(provider)
            {
                return Err(self.surface(provider, error, auth_failure, credential.as_ref()));
            }

            let failure = scrub(&error.to_string(), credential.as_ref());
            match self.credentials.offer_reentry(provider, &failure).await? {
                Some(replacement) => {
                    credential = Some(replacement);
                    attempt += 1;
                }
                None => {
                    return Err(self.surface(provider, error, true, credential.as_ref()));
                }
            }
        }
    }

    /// Convert a backend error into the caller-facing error.
    fn surface(
        &self,
        provider: ProviderId,
        error: TTSError,
        auth_failure: bool,
        credential: Option<&Credential>,
    ) -> SynthesisError {
        let message = scrub(&error.to_string(), credential);
        if auth_failure {
            return SynthesisError::Authentication { provider, message };
        }
        match error {
            TTSError::NetworkError(_) => SynthesisError::Network { provider, message },
            TTSError::InvalidConfiguration(_) => {
                SynthesisError::Configuration { provider, message }
            }
            TTSError::AuthenticationFailed { .. } => {
                SynthesisError::Authentication { provider, message }
            }
            TTSError::ProviderError { .. }
            | TTSError::EngineError(_)
            | TTSError::AudioGenerationFailed(_) => SynthesisError::Provider { provider, message },
        }
    }
}

/// Remove any occurrence of the credential from a message.
fn scrub(message: &str, credential: Option<&Credential>) -> String {
    match credential {
        Some(c) if !c.is_empty() => message.replace(c.expose(), "[REDACTED]"),
        _ => message.to_string(),
    }
}
