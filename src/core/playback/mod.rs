//! Audio playback sessions and rendering surfaces.
//!
//! A [`PlaybackSession`] owns at most one playing audio resource at a time.
//! It writes synthesized bytes to a temporary file, hands the file to a
//! [`RenderSurface`] and drives it with [`ControlMessage`]s.

mod messages;
mod process;
mod session;
mod surface;

use thiserror::Error;

pub use messages::{ControlMessage, Direction};
pub use process::{PlayerCommand, ProcessSurface};
pub use session::{
    EventOutcome, PlaybackSession, PlaybackState, StatusObserver, StopCallback, TEMP_FILE_PREFIX,
};
pub use surface::{
    ChannelSurface, RenderSurface, SurfaceEndpoint, SurfaceEvents, SurfaceRequest, channel_surface,
};

/// Playback failures.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No audio to play")]
    EmptyAudio,

    /// The temporary audio file could not be created or written
    #[error("Failed to write audio to a temporary file: {0}")]
    Resource(#[source] std::io::Error),

    #[error("The playback surface has been disposed")]
    SurfaceDisposed,

    #[error("No audio player found; install ffmpeg (ffplay) or mpg123, or set SPEAK_PLAYER")]
    NoPlayer,

    #[error("Rendering surface unavailable: {0}")]
    Surface(String),

    #[error("Nothing is playing, so there is no audio to save")]
    NothingToSave,

    #[error("Failed to save audio: {0}")]
    Save(#[source] std::io::Error),
}
