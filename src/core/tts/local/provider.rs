use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::core::tts::base::{
    BackendConfig, ProviderId, SynthesisBackend, SynthesisRequest, TTSError, TTSResult,
};
use crate::core::tts::rate::local_words_per_minute;

/// A speech engine binary found on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalEngine {
    /// macOS `say`
    Say(PathBuf),
    /// `espeak-ng` or legacy `espeak`
    Espeak(PathBuf),
}

impl LocalEngine {
    /// Look for an engine on `PATH`, preferring `say`.
    pub fn detect() -> Option<Self> {
        if let Ok(path) = which::which("say") {
            return Some(Self::Say(path));
        }
        which::which("espeak-ng")
            .or_else(|_| which::which("espeak"))
            .ok()
            .map(Self::Espeak)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Say(_) => "say",
            Self::Espeak(_) => "espeak-ng",
        }
    }

    /// Build the command that renders stdin text to `output`.
    fn command(&self, request: &SynthesisRequest, output: &Path) -> Command {
        let wpm = local_words_per_minute(request.speed()).to_string();
        let voice = request.voice().trim();

        match self {
            Self::Say(bin) => {
                let mut cmd = Command::new(bin);
                if !voice.is_empty() {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg("-r")
                    .arg(wpm)
                    .arg("-o")
                    .arg(output)
                    .arg("--data-format=LEI16@22050");
                cmd
            }
            Self::Espeak(bin) => {
                let mut cmd = Command::new(bin);
                if !voice.is_empty() {
                    cmd.arg("-v").arg(voice);
                }
                cmd.arg("-s").arg(wpm).arg("-w").arg(output).arg("--stdin");
                cmd
            }
        }
    }
}

/// Backend driving a local speech engine.
pub struct LocalTTS {
    engine: Option<LocalEngine>,
    scratch_dir: PathBuf,
}

impl LocalTTS {
    pub fn new(_config: &BackendConfig) -> TTSResult<Self> {
        Ok(Self {
            engine: LocalEngine::detect(),
            scratch_dir: std::env::temp_dir(),
        })
    }

    /// Use a specific engine and scratch directory.
    pub fn with_engine(engine: Option<LocalEngine>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn engine(&self) -> Option<&LocalEngine> {
        self.engine.as_ref()
    }
}

#[async_trait]
impl SynthesisBackend for LocalTTS {
    async fn synthesize(&self, request: &SynthesisRequest) -> TTSResult<Bytes> {
        let engine = self.engine.as_ref().ok_or_else(|| {
            TTSError::EngineError(
                "No local speech engine found; install espeak-ng or use a cloud provider".into(),
            )
        })?;

        let output = tempfile::Builder::new()
            .prefix("speak-selection-local-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| TTSError::EngineError(format!("Failed to create scratch file: {e}")))?
            .into_temp_path();

        let mut cmd = engine.command(request, &output);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(engine = engine.name(), "Running local speech engine");
        let mut child = cmd.spawn().map_err(|e| {
            TTSError::EngineError(format!("Failed to start {}: {e}", engine.name()))
        })?;

        // Text goes through stdin to avoid argument escaping
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.text().as_bytes())
                .await
                .map_err(|e| TTSError::EngineError(format!("Failed to send text: {e}")))?;
        }

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| TTSError::EngineError(format!("{} did not finish: {e}", engine.name())))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TTSError::EngineError(format!(
                "{} failed ({}): {}",
                engine.name(),
                result.status,
                stderr.trim()
            )));
        }

        let audio = tokio::fs::read(&output)
            .await
            .map_err(|e| TTSError::EngineError(format!("Failed to read rendered audio: {e}")))?;

        if audio.is_empty() {
            return Err(TTSError::AudioGenerationFailed(format!(
                "{} produced no audio",
                engine.name()
            )));
        }

        Ok(Bytes::from(audio))
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Local
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "local",
            "api_type": "Local process",
            "engine": self.engine.as_ref().map(|e| e.name()),
            "output_format": "wav",
            "requires_credential": false,
        })
    }
}
