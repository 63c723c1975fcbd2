//! OS-native speech backend.
//!
//! Uses macOS `say` when present, otherwise `espeak-ng` (or `espeak`). Both
//! render a WAV file into a scratch location that is read back and removed.
//! No credential is needed.

mod provider;

pub use provider::{LocalEngine, LocalTTS};
