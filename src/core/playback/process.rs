//! A rendering surface backed by an external audio player process.
//!
//! One watcher task per playback owns the child process and applies control
//! commands in the order they were posted. A clean exit reports `ended`; a
//! stop or a failed player reports `stopped`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{ControlMessage, PlaybackError, RenderSurface, SurfaceEvents};

/// Player candidates in preference order, with their leading arguments.
const PLAYERS: &[(&str, &[&str])] = &[
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("mpg123", &["-q"]),
    ("afplay", &[]),
    ("paplay", &[]),
    ("aplay", &["-q"]),
];

/// Players that cannot decode MP3.
const WAV_ONLY: &[&str] = &["paplay", "aplay"];

/// A resolved player binary and the arguments placed before the file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl PlayerCommand {
    /// Resolve a player for `audio`. A configured player name or path wins;
    /// otherwise the first installed candidate able to decode the file is used.
    pub fn locate(preferred: Option<&str>, audio: &Path) -> Option<Self> {
        if let Some(name) = preferred {
            let program = which::which(name).ok()?;
            let stem = program
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let args = PLAYERS
                .iter()
                .find(|(candidate, _)| *candidate == stem)
                .map(|(_, args)| args.iter().map(|a| a.to_string()).collect())
                .unwrap_or_default();
            return Some(Self { program, args });
        }

        let is_wav = audio
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

        PLAYERS
            .iter()
            .filter(|(name, _)| is_wav || !WAV_ONLY.contains(name))
            .find_map(|(name, args)| {
                which::which(name).ok().map(|program| Self {
                    program,
                    args: args.iter().map(|a| a.to_string()).collect(),
                })
            })
    }

    fn spawn(&self, audio: &Path) -> std::io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(audio)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }
}

struct Loaded {
    audio: PathBuf,
    player: PlayerCommand,
    events: mpsc::UnboundedSender<ControlMessage>,
    /// Present once `play` has started the player
    commands: Option<mpsc::UnboundedSender<ControlMessage>>,
}

/// Plays audio through an installed command-line player.
pub struct ProcessSurface {
    preferred: Option<String>,
    current: Option<Loaded>,
    destroyed: bool,
}

impl ProcessSurface {
    pub fn new(preferred: Option<String>) -> Self {
        Self {
            preferred,
            current: None,
            destroyed: false,
        }
    }

    fn release(&mut self) {
        // Dropping the command sender makes the watcher kill the player
        if let Some(loaded) = self.current.take() {
            debug!(audio = %loaded.audio.display(), "Releasing player");
        }
    }
}

impl RenderSurface for ProcessSurface {
    fn load(&mut self, audio: &Path) -> Result<SurfaceEvents, PlaybackError> {
        if self.destroyed {
            return Err(PlaybackError::SurfaceDisposed);
        }
        self.release();

        let player = PlayerCommand::locate(self.preferred.as_deref(), audio)
            .ok_or(PlaybackError::NoPlayer)?;
        debug!(player = %player.program.display(), "Selected audio player");

        let (events, rx) = mpsc::unbounded_channel();
        // The file is already complete on disk, so the surface is ready at once
        let _ = events.send(ControlMessage::Ready);

        self.current = Some(Loaded {
            audio: audio.to_path_buf(),
            player,
            events,
            commands: None,
        });
        Ok(rx)
    }

    fn post(&mut self, message: ControlMessage) {
        let Some(loaded) = self.current.as_mut() else {
            debug!(command = %message, "No loaded audio, dropping control message");
            return;
        };

        if message == ControlMessage::Play {
            if loaded.commands.is_some() {
                debug!("Player already running, ignoring play");
                return;
            }
            match loaded.player.spawn(&loaded.audio) {
                Ok(child) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    tokio::spawn(watch_player(child, rx, loaded.events.clone()));
                    loaded.commands = Some(tx);
                }
                Err(e) => {
                    warn!(error = %e, player = %loaded.player.program.display(), "Failed to start audio player");
                    let _ = loaded.events.send(ControlMessage::Stopped);
                }
            }
            return;
        }

        match &loaded.commands {
            Some(tx) => {
                let _ = tx.send(message);
            }
            None => {
                debug!(command = %message, "Player not started, dropping control message");
            }
        }
    }

    fn reset(&mut self) {
        self.release();
    }

    fn destroy(&mut self) {
        self.release();
        self.destroyed = true;
    }
}

impl Drop for ProcessSurface {
    fn drop(&mut self) {
        self.release();
    }
}

/// Own the player process until it exits or is stopped.
async fn watch_player(
    mut child: Child,
    mut commands: mpsc::UnboundedReceiver<ControlMessage>,
    events: mpsc::UnboundedSender<ControlMessage>,
) {
    let pid = child.id();
    loop {
        tokio::select! {
            status = child.wait() => {
                let _ = events.send(exit_event(status));
                return;
            }
            command = commands.recv() => match command {
                Some(ControlMessage::Pause) => signal(pid, "-STOP").await,
                Some(ControlMessage::Resume) => signal(pid, "-CONT").await,
                Some(ControlMessage::Stop) | None => {
                    if let Err(e) = child.kill().await {
                        debug!(error = %e, "Audio player already gone");
                    }
                    info!("Audio player stopped");
                    let _ = events.send(ControlMessage::Stopped);
                    return;
                }
                Some(other) => debug!(command = %other, "Ignoring command for running player"),
            },
        }
    }
}

/// Only a clean exit counts as the audio playing to its end.
fn exit_event(status: std::io::Result<ExitStatus>) -> ControlMessage {
    match status {
        Ok(status) if status.success() => ControlMessage::Ended,
        Ok(status) => {
            warn!(%status, "Audio player exited with an error, the audio may not have played");
            ControlMessage::Stopped
        }
        Err(e) => {
            warn!(error = %e, "Failed to wait for audio player");
            ControlMessage::Stopped
        }
    }
}

#[cfg(unix)]
async fn signal(pid: Option<u32>, sig: &str) {
    let Some(pid) = pid else { return };
    let result = Command::new("kill")
        .arg(sig)
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        warn!(error = %e, signal = sig, "Failed to signal audio player");
    }
}

#[cfg(not(unix))]
async fn signal(_pid: Option<u32>, sig: &str) {
    warn!(signal = sig, "Pausing the audio player is not supported on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_preferred_player_not_found() {
        assert!(
            PlayerCommand::locate(
                Some("definitely-not-a-player-binary"),
                Path::new("/tmp/a.mp3")
            )
            .is_none()
        );
    }

    #[test]
    fn test_mp3_never_selects_wav_only_player() {
        if let Some(player) = PlayerCommand::locate(None, Path::new("/tmp/a.mp3")) {
            let name = player.program.file_stem().unwrap().to_string_lossy().into_owned();
            assert!(!WAV_ONLY.contains(&name.as_str()));
        }
    }

    #[test]
    fn test_destroyed_surface_refuses_load() {
        let mut surface = ProcessSurface::new(None);
        surface.destroy();
        assert!(matches!(
            surface.load(Path::new("/tmp/a.mp3")),
            Err(PlaybackError::SurfaceDisposed)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_player_lifecycle_with_stand_in_binary() {
        // `true` exits immediately, standing in for a player that finishes
        let Ok(program) = which::which("true") else {
            return;
        };
        let mut surface = ProcessSurface::new(Some(program.to_string_lossy().into_owned()));
        let mut events = surface.load(Path::new("/tmp/a.wav")).unwrap();

        assert_eq!(events.recv().await, Some(ControlMessage::Ready));
        surface.post(ControlMessage::Play);
        assert_eq!(events.recv().await, Some(ControlMessage::Ended));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_player_reports_stopped() {
        // `false` exits non-zero, like a player that cannot decode the file
        let Ok(program) = which::which("false") else {
            return;
        };
        let mut surface = ProcessSurface::new(Some(program.to_string_lossy().into_owned()));
        let mut events = surface.load(Path::new("/tmp/a.wav")).unwrap();

        assert_eq!(events.recv().await, Some(ControlMessage::Ready));
        surface.post(ControlMessage::Play);
        assert_eq!(events.recv().await, Some(ControlMessage::Stopped));
    }

    #[test]
    fn test_wait_error_reports_stopped() {
        let error = std::io::Error::other("wait failed");
        assert_eq!(exit_event(Err(error)), ControlMessage::Stopped);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_kills_player() {
        let Ok(program) = which::which("sleep") else {
            return;
        };
        let mut surface = ProcessSurface::new(Some(program.to_string_lossy().into_owned()));
        // `sleep 30` stands in for a long playback
        let mut events = surface.load(Path::new("30")).unwrap();
        assert_eq!(events.recv().await, Some(ControlMessage::Ready));

        surface.post(ControlMessage::Play);
        surface.post(ControlMessage::Pause);
        surface.post(ControlMessage::Resume);
        surface.post(ControlMessage::Stop);
        assert_eq!(events.recv().await, Some(ControlMessage::Stopped));
    }
}
