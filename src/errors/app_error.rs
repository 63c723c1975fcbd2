use thiserror::Error;

use crate::config::ConfigError;
use crate::core::credentials::CredentialError;
use crate::core::playback::PlaybackError;
use crate::core::synthesis::SynthesisError;
use crate::core::tts::ValidationError;

/// Every terminal failure the application surfaces to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// One human-readable line for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => format!("Nothing was read aloud: {e}"),
            Self::Synthesis(e) if e.is_authentication() => {
                format!("{e}. Update the API key and try again.")
            }
            Self::Synthesis(e) => format!("Speech synthesis failed: {e}"),
            Self::Playback(e) => format!("Playback failed: {e}"),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Credential(e) => format!("Could not access stored credentials: {e}"),
        }
    }

    /// Whether retrying the same request unchanged could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Synthesis(SynthesisError::Network { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tts::ProviderId;

    #[test]
    fn test_user_message_is_single_line() {
        let errors: Vec<AppError> = vec![
            ValidationError::EmptyText.into(),
            ValidationError::TextTooLong { len: 10, max: 5 }.into(),
            SynthesisError::Authentication {
                provider: ProviderId::OpenAI,
                message: "HTTP 401: Incorrect API key provided".into(),
            }
            .into(),
            PlaybackError::NoPlayer.into(),
            ConfigError::UnknownProvider("polly".into()).into(),
        ];

        for error in errors {
            let message = error.user_message();
            assert!(!message.is_empty());
            assert!(!message.contains('\n'), "{message}");
        }
    }

    #[test]
    fn test_auth_message_suggests_new_key() {
        let error: AppError = SynthesisError::Authentication {
            provider: ProviderId::Azure,
            message: "HTTP 401".into(),
        }
        .into();
        assert!(error.user_message().contains("API key"));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_network_errors_are_transient() {
        let error: AppError = SynthesisError::Network {
            provider: ProviderId::ElevenLabs,
            message: "connection refused".into(),
        }
        .into();
        assert!(error.is_transient());
        assert!(error.user_message().starts_with("Speech synthesis failed"));
    }
}
