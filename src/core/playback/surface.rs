//! The rendering-surface seam and an in-process channel implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ControlMessage, Direction, PlaybackError};

/// Per-session stream of surface-to-host messages.
pub type SurfaceEvents = mpsc::UnboundedReceiver<ControlMessage>;

/// Something that can render an audio file under host control.
///
/// `load` starts a new session and returns the receiver for that session's
/// events. After `reset` or another `load`, events from the earlier session
/// must not reach the new receiver.
pub trait RenderSurface: Send {
    fn load(&mut self, audio: &Path) -> Result<SurfaceEvents, PlaybackError>;

    /// Send a host-to-surface message. Never fails; a gone surface drops it.
    fn post(&mut self, message: ControlMessage);

    /// Stop rendering and detach the current session, keeping the surface.
    fn reset(&mut self);

    /// Tear the surface down for good.
    fn destroy(&mut self);
}

/// Requests observed by the far end of a [`ChannelSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceRequest {
    Load { audio: PathBuf },
    Control(ControlMessage),
    Reset,
    Destroy,
}

#[derive(Debug, Default)]
struct Link {
    /// Incremented on every load/reset/destroy
    generation: u64,
    events: Option<mpsc::UnboundedSender<ControlMessage>>,
}

/// A surface whose renderer lives at the other end of a channel, such as a
/// UI component or a test driver.
///
/// Seek and playback rate belong to the renderer. It applies them to the
/// loaded file locally, so they have no control message and leave the
/// session state untouched. Synthesis speed is set on the request instead.
#[derive(Debug)]
pub struct ChannelSurface {
    requests: mpsc::UnboundedSender<SurfaceRequest>,
    link: Arc<Mutex<Link>>,
    destroyed: bool,
}

/// The renderer's side of a [`ChannelSurface`].
#[derive(Debug)]
pub struct SurfaceEndpoint {
    requests: mpsc::UnboundedReceiver<SurfaceRequest>,
    link: Arc<Mutex<Link>>,
    /// Generation of the last request this endpoint has seen
    observed: u64,
}

/// Create a connected surface/endpoint pair.
pub fn channel_surface() -> (ChannelSurface, SurfaceEndpoint) {
    let (tx, rx) = mpsc::unbounded_channel();
    let link = Arc::new(Mutex::new(Link::default()));
    (
        ChannelSurface {
            requests: tx,
            link: link.clone(),
            destroyed: false,
        },
        SurfaceEndpoint {
            requests: rx,
            link,
            observed: 0,
        },
    )
}

impl ChannelSurface {
    fn detach(&self) {
        let mut link = self.link.lock();
        link.generation += 1;
        link.events = None;
    }
}

impl RenderSurface for ChannelSurface {
    fn load(&mut self, audio: &Path) -> Result<SurfaceEvents, PlaybackError> {
        if self.destroyed {
            return Err(PlaybackError::SurfaceDisposed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut link = self.link.lock();
            link.generation += 1;
            link.events = Some(tx);
        }

        self.requests
            .send(SurfaceRequest::Load {
                audio: audio.to_path_buf(),
            })
            .map_err(|_| PlaybackError::Surface("renderer disconnected".into()))?;
        Ok(rx)
    }

    fn post(&mut self, message: ControlMessage) {
        if self.requests.send(SurfaceRequest::Control(message)).is_err() {
            debug!(command = %message, "Renderer gone, dropping control message");
        }
    }

    fn reset(&mut self) {
        self.detach();
        let _ = self.requests.send(SurfaceRequest::Reset);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.detach();
        self.destroyed = true;
        let _ = self.requests.send(SurfaceRequest::Destroy);
    }
}

impl SurfaceEndpoint {
    /// Wait for the next request from the host.
    pub async fn recv(&mut self) -> Option<SurfaceRequest> {
        let request = self.requests.recv().await;
        self.observe(request.as_ref());
        request
    }

    /// Take a pending request without waiting.
    pub fn try_recv(&mut self) -> Option<SurfaceRequest> {
        let request = self.requests.try_recv().ok();
        self.observe(request.as_ref());
        request
    }

    fn observe(&mut self, request: Option<&SurfaceRequest>) {
        if matches!(
            request,
            Some(SurfaceRequest::Load { .. } | SurfaceRequest::Reset | SurfaceRequest::Destroy)
        ) {
            self.observed += 1;
        }
    }

    /// Send an event to the session the endpoint last saw loaded.
    ///
    /// Returns `Ok(false)` when that session has since been replaced or
    /// released, in which case the event is dropped.
    pub fn send(&self, event: ControlMessage) -> Result<bool, PlaybackError> {
        if event.direction() != Direction::SurfaceToHost {
            return Err(PlaybackError::Surface(format!(
                "'{event}' is a host command and cannot be sent by a surface"
            )));
        }

        let link = self.link.lock();
        if link.generation != self.observed {
            debug!(command = %event, "Dropping event for a replaced session");
            return Ok(false);
        }
        Ok(match &link.events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        })
    }

    /// Send a raw JSON event, as a web view or IPC peer would.
    pub fn send_wire(&self, raw: &str) -> Result<bool, PlaybackError> {
        let event = ControlMessage::from_wire(raw).map_err(|e| {
            warn!(error = %e, "Malformed control message from surface");
            PlaybackError::Surface(format!("malformed control message: {e}"))
        })?;
        self.send(event)
    }
}

/// A vanished renderer closes the current session's event channel.
impl Drop for SurfaceEndpoint {
    fn drop(&mut self) {
        self.link.lock().events = None;
    }
}
