use std::io::{BufRead, Write};

use async_trait::async_trait;
use tracing::warn;

use super::{Credential, CredentialPrompt, PromptResponse};
use crate::core::tts::ProviderId;

/// Prompts on stderr and reads answers from stdin.
///
/// End of input counts as cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    async fn ask(question: String) -> Option<String> {
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{question}");
            let _ = stderr.flush();

            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) => None,
                Ok(_) => Some(line),
                Err(e) => {
                    warn!(error = %e, "Failed to read answer from stdin");
                    None
                }
            }
        })
        .await;

        answer.ok().flatten()
    }
}

/// Interpret a typed credential line.
pub(crate) fn parse_credential_answer(line: Option<&str>, has_existing: bool) -> PromptResponse {
    match line.map(str::trim) {
        None => PromptResponse::Cancelled,
        Some("") if has_existing => PromptResponse::KeepExisting,
        Some("") => PromptResponse::Cancelled,
        Some(secret) => PromptResponse::Entered(Credential::new(secret)),
    }
}

/// Interpret a yes/no line; anything but an explicit yes is a no.
pub(crate) fn parse_confirmation(line: Option<&str>) -> bool {
    matches!(
        line.map(|l| l.trim().to_lowercase()).as_deref(),
        Some("y") | Some("yes")
    )
}

#[async_trait]
impl CredentialPrompt for TerminalPrompt {
    async fn request_credential(&self, provider: ProviderId, has_existing: bool) -> PromptResponse {
        let question = if has_existing {
            format!(
                "{} API key (press Enter to keep the current one): ",
                provider.display_name()
            )
        } else {
            format!(
                "{} API key (press Enter to cancel): ",
                provider.display_name()
            )
        };

        let answer = Self::ask(question).await;
        parse_credential_answer(answer.as_deref(), has_existing)
    }

    async fn confirm_reentry(&self, provider: ProviderId, failure: &str) -> bool {
        let question = format!(
            "{} rejected the API key ({failure}). Enter a new one? [y/N] ",
            provider.display_name()
        );
        parse_confirmation(Self::ask(question).await.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credential_answer() {
        assert_eq!(
            parse_credential_answer(Some("  sk-abc \n"), false),
            PromptResponse::Entered(Credential::new("sk-abc"))
        );
        assert_eq!(
            parse_credential_answer(Some("\n"), true),
            PromptResponse::KeepExisting
        );
        assert_eq!(
            parse_credential_answer(Some("\n"), false),
            PromptResponse::Cancelled
        );
        assert_eq!(parse_credential_answer(None, true), PromptResponse::Cancelled);
    }

    #[test]
    fn test_parse_confirmation() {
        assert!(parse_confirmation(Some("y\n")));
        assert!(parse_confirmation(Some(" YES ")));
        assert!(!parse_confirmation(Some("n")));
        assert!(!parse_confirmation(Some("")));
        assert!(!parse_confirmation(None));
    }
}
