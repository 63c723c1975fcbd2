//! Test Fixtures Module
//!
//! Shared helpers for the integration tests:
//! - Audio payloads (programmatically generated WAV and MP3 bytes)
//! - Scripted credential and download prompts
//! - Controller assembly against a mock HTTP server

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod audio_fixtures;
pub mod prompts;

pub use audio_fixtures::*;
pub use prompts::*;
