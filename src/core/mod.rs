pub mod controller;
pub mod credentials;
pub mod playback;
pub mod synthesis;
pub mod tts;

// Re-export commonly used types for convenience
pub use controller::{
    DirectoryDownloads, DownloadPrompt, EventReport, SpeakOutcome, SpeechController, SpeechOptions,
};

pub use credentials::{
    Credential, CredentialError, CredentialPrompt, CredentialResolver, CredentialStore,
    FileCredentialStore, PromptResponse, TerminalPrompt,
};

pub use playback::{
    ChannelSurface, ControlMessage, EventOutcome, PlaybackError, PlaybackSession, PlaybackState,
    ProcessSurface, RenderSurface, StatusObserver, StopCallback,
};

pub use synthesis::{AuthSignature, SynthesisError, SynthesisOrchestrator, SynthesisOutcome};

pub use tts::{
    BackendConfig, BackendFactory, ProviderId, ProviderRegistry, SynthesisBackend,
    SynthesisRequest, TTSError, TTSResult, ValidationError, create_tts_provider,
    get_tts_provider_urls,
};
