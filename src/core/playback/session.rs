use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempPath;
use tracing::{debug, info, warn};

use super::{ControlMessage, Direction, PlaybackError, RenderSurface, SurfaceEvents};
use crate::core::tts::AudioContainer;

/// Prefix of every temporary audio file.
pub const TEMP_FILE_PREFIX: &str = "speak-selection-";

/// Invoked exactly once when a session's audio stops being played.
pub type StopCallback = Box<dyn FnOnce() + Send>;

/// Receives coarse active/idle notifications.
pub trait StatusObserver: Send + Sync {
    /// Called on every transition between idle and any active state.
    fn on_status(&self, active: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Audio handed to the surface, waiting for `ready`
    Loading,
    Playing,
    Paused,
}

impl PlaybackState {
    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// What the host should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    /// The surface asked to save the current audio
    DownloadRequested,
    /// Not meaningful in the current state
    Ignored,
}

struct ActiveAudio {
    file: TempPath,
    container: AudioContainer,
    events: SurfaceEvents,
    on_stop: Option<StopCallback>,
}

/// Owns the single playing audio resource.
///
/// All operations take `&mut self`, so a teardown and the following setup in
/// [`play`](Self::play) can never interleave with another operation.
pub struct PlaybackSession {
    surface: Option<Box<dyn RenderSurface>>,
    state: PlaybackState,
    active: Option<ActiveAudio>,
    observers: Vec<Arc<dyn StatusObserver>>,
    /// Last activity value sent to observers
    reported_active: bool,
    temp_dir: PathBuf,
}

impl PlaybackSession {
    pub fn new(surface: Box<dyn RenderSurface>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            surface: Some(surface),
            state: PlaybackState::Idle,
            active: None,
            observers: Vec::new(),
            reported_active: false,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }

    /// Path of the current temporary audio file.
    pub fn audio_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| &*a.file)
    }

    pub fn audio_container(&self) -> Option<AudioContainer> {
        self.active.as_ref().map(|a| a.container)
    }

    /// Start playing `audio`, replacing whatever was playing.
    ///
    /// The previous session is torn down first, including its `on_stop`.
    /// Failures before the surface accepts the audio leave the session idle.
    pub async fn play(&mut self, audio: Bytes, on_stop: StopCallback) -> Result<(), PlaybackError> {
        if self.surface.is_none() {
            return Err(PlaybackError::SurfaceDisposed);
        }
        if audio.is_empty() {
            return Err(PlaybackError::EmptyAudio);
        }

        self.teardown();

        let container = AudioContainer::sniff(&audio);
        let file = match self.write_temp(&audio, container).await {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "Failed to stage audio for playback");
                self.set_state(PlaybackState::Idle);
                return Err(e);
            }
        };

        let loaded = match self.surface.as_mut() {
            Some(surface) => surface.load(&file),
            None => Err(PlaybackError::SurfaceDisposed),
        };
        let events = match loaded {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Rendering surface rejected audio");
                remove_temp(file);
                self.set_state(PlaybackState::Idle);
                return Err(e);
            }
        };

        info!(
            path = %file.display(),
            format = container.extension(),
            bytes = audio.len(),
            "Audio loaded"
        );
        self.active = Some(ActiveAudio {
            file,
            container,
            events,
            on_stop: Some(on_stop),
        });
        self.set_state(PlaybackState::Loading);
        Ok(())
    }

    async fn write_temp(
        &self,
        audio: &[u8],
        container: AudioContainer,
    ) -> Result<TempPath, PlaybackError> {
        let suffix = format!(".{}", container.extension());
        let file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(PlaybackError::Resource)?
            .into_temp_path();

        tokio::fs::write(&file, audio)
            .await
            .map_err(PlaybackError::Resource)?;
        Ok(file)
    }

    /// Wait for the next message from the surface for the current session.
    ///
    /// Pends forever while idle, so it can sit in a `select!` next to other
    /// branches. Returns `None` when the surface side closed, after the
    /// session has been released.
    pub async fn next_event(&mut self) -> Option<ControlMessage> {
        let received = match self.active.as_mut() {
            Some(active) => active.events.recv().await,
            None => std::future::pending().await,
        };

        if received.is_none() {
            info!("Rendering surface closed, releasing audio");
            self.finish();
        }
        received
    }

    /// Apply a message from the surface.
    pub fn handle_event(&mut self, event: ControlMessage) -> EventOutcome {
        if event.direction() != Direction::SurfaceToHost {
            warn!(command = %event, "Ignoring host command received from surface");
            return EventOutcome::Ignored;
        }

        match (event, self.state) {
            (ControlMessage::Ready, PlaybackState::Loading) => {
                self.post(ControlMessage::Play);
                self.set_state(PlaybackState::Playing);
                EventOutcome::Handled
            }
            (ControlMessage::Ended | ControlMessage::Stopped, state) if state.is_active() => {
                debug!(command = %event, "Playback finished");
                self.finish();
                EventOutcome::Handled
            }
            (ControlMessage::DownloadRequested, state) if state.is_active() => {
                EventOutcome::DownloadRequested
            }
            (event, state) => {
                debug!(command = %event, state = ?state, "Ignoring surface event");
                EventOutcome::Ignored
            }
        }
    }

    /// Pause while playing; otherwise a no-op.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.post(ControlMessage::Pause);
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Resume while paused; otherwise a no-op.
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.post(ControlMessage::Resume);
            self.set_state(PlaybackState::Playing);
        }
    }

    /// Stop and release the current audio. Idempotent.
    pub fn stop(&mut self) {
        if self.active.is_some() {
            self.post(ControlMessage::Stop);
        }
        self.finish();
    }

    /// Stop and destroy the surface. Later `play` calls fail.
    pub fn dispose(&mut self) {
        self.stop();
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
            info!("Playback surface disposed");
        }
    }

    /// Copy the current audio to `dest`, returning the bytes written.
    pub async fn save_audio(&self, dest: &Path) -> Result<u64, PlaybackError> {
        let active = self.active.as_ref().ok_or(PlaybackError::NothingToSave)?;
        let copied = tokio::fs::copy(&active.file, dest)
            .await
            .map_err(PlaybackError::Save)?;
        info!(dest = %dest.display(), bytes = copied, "Saved audio");
        Ok(copied)
    }

    fn post(&mut self, message: ControlMessage) {
        if let Some(surface) = self.surface.as_mut() {
            surface.post(message);
        }
    }

    /// Release the current audio and go idle, notifying observers.
    fn finish(&mut self) {
        self.release();
        self.set_state(PlaybackState::Idle);
    }

    /// Release the current audio before a new `play`. Observers are not
    /// told about the momentary idle state.
    fn teardown(&mut self) {
        if self.active.is_some() {
            if let Some(surface) = self.surface.as_mut() {
                surface.reset();
            }
            self.release();
        }
        self.state = PlaybackState::Idle;
    }

    fn release(&mut self) {
        if let Some(mut active) = self.active.take() {
            drop(active.events);
            remove_temp(active.file);
            if let Some(on_stop) = active.on_stop.take() {
                on_stop();
            }
        }
    }

    fn set_state(&mut self, next: PlaybackState) {
        self.state = next;
        let active = next.is_active();
        if active != self.reported_active {
            self.reported_active = active;
            for observer in &self.observers {
                observer.on_status(active);
            }
        }
    }
}

fn remove_temp(file: TempPath) {
    let path = file.to_path_buf();
    if let Err(e) = file.close() {
        warn!(path = %path.display(), error = %e, "Failed to remove temporary audio");
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if self.active.is_some() {
            self.post(ControlMessage::Stop);
            self.release();
        }
    }
}
