//! Per-provider credential storage and interactive acquisition.
//!
//! A [`CredentialResolver`] combines a persistent [`CredentialStore`] with an
//! interactive [`CredentialPrompt`]. The orchestrator asks it for a stored
//! credential, prompts when none exists, and offers re-entry after an
//! authentication failure.

mod prompt;
mod store;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::tts::ProviderId;

pub use prompt::TerminalPrompt;
pub use store::{FileCredentialStore, MemoryCredentialStore};

/// A secret API key. Wiped from memory on drop, never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret, trimming surrounding whitespace.
    pub fn new(secret: impl Into<String>) -> Self {
        let mut secret = secret.into();
        let trimmed = secret.trim().to_string();
        secret.zeroize();
        Self(trimmed)
    }

    /// The raw secret, for building request headers only.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Credential storage failures.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store is corrupt: {0}")]
    Format(String),
}

/// Persistent per-provider credential slots.
pub trait CredentialStore: Send + Sync {
    fn load(&self, provider: ProviderId) -> Result<Option<Credential>, CredentialError>;
    fn save(&self, provider: ProviderId, credential: &Credential) -> Result<(), CredentialError>;
}

/// What the user answered when asked for a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    /// A new credential was typed in
    Entered(Credential),
    /// Keep whatever is already stored
    KeepExisting,
    /// The prompt was dismissed
    Cancelled,
}

/// Interactive credential acquisition.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    /// Ask for a credential. `has_existing` tells the prompt whether
    /// "keep the current one" is a meaningful answer.
    async fn request_credential(&self, provider: ProviderId, has_existing: bool)
    -> PromptResponse;

    /// After a rejection, ask whether the user wants to enter a new credential.
    async fn confirm_reentry(&self, provider: ProviderId, failure: &str) -> bool;
}

/// Result of one prompt round.
enum Acquired {
    New(Credential),
    Kept(Credential),
    None,
}

/// Reads, prompts for and persists provider credentials.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    prompt: Arc<dyn CredentialPrompt>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>, prompt: Arc<dyn CredentialPrompt>) -> Self {
        Self { store, prompt }
    }

    /// False only for providers that run without a credential.
    pub fn needs_credential(&self, provider: ProviderId) -> bool {
        provider.requires_credential()
    }

    /// The stored credential, if any. Empty values count as absent.
    pub fn get(&self, provider: ProviderId) -> Result<Option<Credential>, CredentialError> {
        Ok(self.store.load(provider)?.filter(|c| !c.is_empty()))
    }

    /// Prompt for a credential and persist it.
    ///
    /// Keeping the existing value returns it unchanged. `None` means the user
    /// cancelled.
    pub async fn prompt_and_store(
        &self,
        provider: ProviderId,
    ) -> Result<Option<Credential>, CredentialError> {
        Ok(match self.acquire(provider).await? {
            Acquired::New(credential) | Acquired::Kept(credential) => Some(credential),
            Acquired::None => None,
        })
    }

    /// After an authentication failure, offer to replace the credential.
    ///
    /// Returns `Some` only when a new credential was entered and saved;
    /// declining, cancelling or keeping the existing value all return `None`.
    pub async fn offer_reentry(
        &self,
        provider: ProviderId,
        failure: &str,
    ) -> Result<Option<Credential>, CredentialError> {
        if !self.prompt.confirm_reentry(provider, failure).await {
            debug!(provider = %provider, "Credential re-entry declined");
            return Ok(None);
        }

        Ok(match self.acquire(provider).await? {
            Acquired::New(credential) => Some(credential),
            Acquired::Kept(_) | Acquired::None => None,
        })
    }

    async fn acquire(&self, provider: ProviderId) -> Result<Acquired, CredentialError> {
        let existing = self.get(provider)?;

        match self
            .prompt
            .request_credential(provider, existing.is_some())
            .await
        {
            PromptResponse::Entered(credential) if !credential.is_empty() => {
                self.store.save(provider, &credential)?;
                info!(provider = %provider, "Stored new credential");
                Ok(Acquired::New(credential))
            }
            PromptResponse::KeepExisting => {
                Ok(existing.map(Acquired::Kept).unwrap_or(Acquired::None))
            }
            PromptResponse::Entered(_) | PromptResponse::Cancelled => Ok(Acquired::None),
        }
    }
}
