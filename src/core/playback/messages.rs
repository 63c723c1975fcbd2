//! Control protocol between the playback session and a rendering surface.
//!
//! Messages are JSON objects tagged by `command`:
//!
//! ```json
//! {"command": "ready"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the link sends a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HostToSurface,
    SurfaceToHost,
}

/// One control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum ControlMessage {
    // =========================================================================
    // Surface -> Host
    // =========================================================================
    /// The surface loaded the audio and can start
    #[serde(rename = "ready")]
    Ready,

    /// Playback reached the end of the audio
    #[serde(rename = "ended")]
    Ended,

    /// The surface stopped playback on its own (closed, killed)
    #[serde(rename = "stopped")]
    Stopped,

    /// The user asked to save the audio
    #[serde(rename = "download")]
    DownloadRequested,

    // =========================================================================
    // Host -> Surface
    // =========================================================================
    #[serde(rename = "play")]
    Play,

    #[serde(rename = "pause")]
    Pause,

    #[serde(rename = "resume")]
    Resume,

    #[serde(rename = "stop")]
    Stop,
}

impl ControlMessage {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Ended => "ended",
            Self::Stopped => "stopped",
            Self::DownloadRequested => "download",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Ready | Self::Ended | Self::Stopped | Self::DownloadRequested => {
                Direction::SurfaceToHost
            }
            Self::Play | Self::Pause | Self::Resume | Self::Stop => Direction::HostToSurface,
        }
    }

    /// JSON encoding.
    pub fn to_wire(&self) -> String {
        format!(r#"{{"command":"{}"}}"#, self.as_str())
    }

    /// Decode a JSON message.
    pub fn from_wire(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
