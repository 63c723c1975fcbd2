//! Top-level owner of synthesis and playback.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::core::playback::{
    ControlMessage, EventOutcome, PlaybackError, PlaybackSession, StopCallback,
};
use crate::core::synthesis::{SynthesisOrchestrator, SynthesisOutcome};
use crate::core::tts::{AudioContainer, ProviderId, SynthesisRequest, ValidationError};
use crate::errors::{AppError, AppResult};

/// Asks where a downloaded copy of the current audio should go.
#[async_trait]
pub trait DownloadPrompt: Send + Sync {
    /// `None` means the user declined.
    async fn choose_destination(&self, suggested_name: &str) -> Option<PathBuf>;
}

/// Saves every download into one directory under the suggested name.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, or the working directory.
    pub fn user_default() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }
}

#[async_trait]
impl DownloadPrompt for DirectoryDownloads {
    async fn choose_destination(&self, suggested_name: &str) -> Option<PathBuf> {
        Some(self.dir.join(suggested_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Audio was handed to the playback session
    Playing,
    /// The user cancelled before audio was produced
    Cancelled,
}

/// Result of applying one surface event.
#[derive(Debug)]
pub enum EventReport {
    Applied(EventOutcome),
    /// A copy of the current audio was saved here
    Downloaded(PathBuf),
    DownloadDeclined,
    /// Saving failed; playback is unaffected
    DownloadFailed(AppError),
}

/// What a speak call should use.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub provider: ProviderId,
    pub voice: String,
    pub speed: f32,
    pub max_chars: usize,
}

impl From<&Settings> for SpeechOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            provider: settings.provider,
            voice: settings.effective_voice(),
            speed: settings.speed,
            max_chars: settings.max_chars,
        }
    }
}

/// Validates requests, runs synthesis and feeds the one playback session.
pub struct SpeechController {
    orchestrator: SynthesisOrchestrator,
    session: PlaybackSession,
    downloads: Arc<dyn DownloadPrompt>,
    options: SpeechOptions,
}

impl SpeechController {
    pub fn new(
        orchestrator: SynthesisOrchestrator,
        session: PlaybackSession,
        downloads: Arc<dyn DownloadPrompt>,
        options: SpeechOptions,
    ) -> Self {
        Self {
            orchestrator,
            session,
            downloads,
            options,
        }
    }

    pub fn options(&self) -> &SpeechOptions {
        &self.options
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PlaybackSession {
        &mut self.session
    }

    /// Build a validated request from `text` with the configured options.
    pub fn request_for(&self, text: &str) -> Result<SynthesisRequest, ValidationError> {
        SynthesisRequest::new(
            text,
            self.options.voice.clone(),
            self.options.speed,
            self.options.max_chars,
        )
    }

    /// Synthesize `text` without touching playback. `None` when cancelled.
    pub async fn synthesize(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<Bytes>> {
        let request = self.request_for(text)?;
        info!(
            provider = %self.options.provider,
            voice = request.voice(),
            speed = request.speed(),
            chars = request.text().chars().count(),
            "Synthesizing selection"
        );

        match self
            .orchestrator
            .run(&request, self.options.provider, cancel)
            .await?
        {
            SynthesisOutcome::Audio(audio) => Ok(Some(audio)),
            SynthesisOutcome::Cancelled => Ok(None),
        }
    }

    /// Synthesize `text` and start playing it, replacing any current audio.
    ///
    /// `on_stop` runs once when this audio stops playing for any reason.
    pub async fn speak(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
        on_stop: StopCallback,
    ) -> AppResult<SpeakOutcome> {
        let Some(audio) = self.synthesize(text, cancel).await? else {
            return Ok(SpeakOutcome::Cancelled);
        };
        if cancel.is_cancelled() {
            debug!("Cancelled after synthesis, not starting playback");
            return Ok(SpeakOutcome::Cancelled);
        }

        self.session.play(audio, on_stop).await?;
        Ok(SpeakOutcome::Playing)
    }

    /// Synthesize `text` straight to `dest`. `None` when cancelled.
    pub async fn synthesize_to_file(
        &self,
        text: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> AppResult<Option<u64>> {
        let Some(audio) = self.synthesize(text, cancel).await? else {
            return Ok(None);
        };
        tokio::fs::write(dest, &audio)
            .await
            .map_err(PlaybackError::Save)?;
        info!(dest = %dest.display(), bytes = audio.len(), "Saved synthesized audio");
        Ok(Some(audio.len() as u64))
    }

    /// Next event from the rendering surface; pends while idle.
    pub async fn next_event(&mut self) -> Option<ControlMessage> {
        self.session.next_event().await
    }

    /// Apply a surface event, resolving download requests.
    ///
    /// A failed download is reported, never raised: the session keeps
    /// playing.
    pub async fn process_event(&mut self, event: ControlMessage) -> EventReport {
        match self.session.handle_event(event) {
            EventOutcome::DownloadRequested => match self.download().await {
                Ok(Some(dest)) => EventReport::Downloaded(dest),
                Ok(None) => EventReport::DownloadDeclined,
                Err(e) => {
                    warn!(error = %e, "Download failed, playback continues");
                    EventReport::DownloadFailed(e)
                }
            },
            outcome => EventReport::Applied(outcome),
        }
    }

    /// Wait for and apply one surface event. Returns `false` once the
    /// session is idle.
    pub async fn process_next_event(&mut self) -> bool {
        if !self.session.is_active() {
            return false;
        }
        match self.next_event().await {
            Some(event) => {
                self.process_event(event).await;
            }
            None => debug!("Surface closed"),
        }
        self.session.is_active()
    }

    /// Pump surface events until playback finishes.
    pub async fn run_until_idle(&mut self) {
        while self.process_next_event().await {}
    }

    /// Ask where to save the current audio and copy it there.
    pub async fn download(&mut self) -> AppResult<Option<PathBuf>> {
        let container = self
            .session
            .audio_container()
            .ok_or(PlaybackError::NothingToSave)?;
        let name = suggested_file_name(container);

        let Some(dest) = self.downloads.choose_destination(&name).await else {
            info!("Download declined");
            return Ok(None);
        };
        self.save_current(&dest).await?;
        Ok(Some(dest))
    }

    /// Copy the current audio to `dest`.
    pub async fn save_current(&self, dest: &Path) -> AppResult<u64> {
        Ok(self.session.save_audio(dest).await?)
    }

    pub fn pause(&mut self) {
        self.session.pause();
    }

    pub fn resume(&mut self) {
        self.session.resume();
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn dispose(&mut self) {
        self.session.dispose();
    }
}

fn suggested_file_name(container: AudioContainer) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("speech-{stamp}.{}", container.extension())
}
