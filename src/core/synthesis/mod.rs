//! Credential-aware synthesis with a single re-entry retry.

mod auth_signature;
mod orchestrator;

use bytes::Bytes;
use thiserror::Error;

use crate::core::credentials::CredentialError;
use crate::core::tts::ProviderId;

pub use auth_signature::{AUTH_FAILURE_MARKERS, AUTH_FAILURE_STATUSES, AuthSignature, is_auth_failure};
pub use orchestrator::{MAX_ATTEMPTS, SynthesisOrchestrator};

/// Successful end states of a synthesis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Encoded audio (MP3 or WAV container)
    Audio(Bytes),
    /// The user cancelled: dismissed a prompt or signalled the token
    Cancelled,
}

/// A synthesis run that ended in failure. Messages never contain credentials.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The provider rejected the credential and no new one was supplied
    #[error("{provider} rejected the credential: {message}")]
    Authentication {
        provider: ProviderId,
        message: String,
    },

    #[error("{provider} could not be reached: {message}")]
    Network {
        provider: ProviderId,
        message: String,
    },

    /// Quota, rate limit, server error, empty audio or engine failure
    #[error("{provider} failed: {message}")]
    Provider {
        provider: ProviderId,
        message: String,
    },

    #[error("{provider} is not usable: {message}")]
    Configuration {
        provider: ProviderId,
        message: String,
    },

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl SynthesisError {
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::Authentication { provider, .. }
            | Self::Network { provider, .. }
            | Self::Provider { provider, .. }
            | Self::Configuration { provider, .. } => Some(*provider),
            Self::Credential(_) => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
