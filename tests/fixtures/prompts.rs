//! Scripted stand-ins for the interactive prompts.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use speak_selection::core::credentials::{Credential, CredentialPrompt, PromptResponse};
use speak_selection::{DownloadPrompt, ProviderId};

/// Replays queued answers and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<PromptResponse>>,
    confirm: bool,
    pub requests: AtomicUsize,
    pub confirmations: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(confirm: bool) -> Self {
        Self {
            confirm,
            ..Default::default()
        }
    }

    pub fn answer(self, secret: &str) -> Self {
        self.answers
            .lock()
            .push_back(PromptResponse::Entered(Credential::new(secret)));
        self
    }

    pub fn cancel(self) -> Self {
        self.answers.lock().push_back(PromptResponse::Cancelled);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialPrompt for ScriptedPrompt {
    async fn request_credential(&self, _: ProviderId, _: bool) -> PromptResponse {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .pop_front()
            .unwrap_or(PromptResponse::Cancelled)
    }

    async fn confirm_reentry(&self, _: ProviderId, _: &str) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        self.confirm
    }
}

/// Always answers with the same destination.
pub struct FixedDownload(pub Option<PathBuf>);

#[async_trait]
impl DownloadPrompt for FixedDownload {
    async fn choose_destination(&self, _: &str) -> Option<PathBuf> {
        self.0.clone()
    }
}

pub fn fixed_download(dest: Option<PathBuf>) -> Arc<dyn DownloadPrompt> {
    Arc::new(FixedDownload(dest))
}
