//! End-to-end tests: controller, mocked vendor and channel surface
//!
//! Each test drives a full read-aloud: validation, credential handling,
//! synthesis over HTTP, playback events and cleanup.

mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fixtures::{ScriptedPrompt, fixed_download, mp3_silence};
use speak_selection::core::credentials::MemoryCredentialStore;
use speak_selection::core::playback::{SurfaceEndpoint, SurfaceRequest, channel_surface};
use speak_selection::{
    AppError, ControlMessage, CredentialResolver, DownloadPrompt, EventReport, PlaybackError,
    PlaybackSession, PlaybackState, ProviderId, ProviderRegistry, SpeakOutcome, SpeechController,
    SpeechOptions, StopCallback, SynthesisOrchestrator, ValidationError,
};

const SPEECH_PATH: &str = "/v1/audio/speech";

struct Harness {
    controller: SpeechController,
    endpoint: SurfaceEndpoint,
    prompt: Arc<ScriptedPrompt>,
}

fn harness(
    server: &MockServer,
    temp_dir: &Path,
    stored_key: &str,
    prompt: ScriptedPrompt,
    downloads: Arc<dyn DownloadPrompt>,
) -> Harness {
    let registry = ProviderRegistry::new().with_endpoint(
        ProviderId::OpenAI,
        format!("{}{SPEECH_PATH}", server.uri()),
    );
    let prompt = Arc::new(prompt);
    let resolver = CredentialResolver::new(
        Arc::new(MemoryCredentialStore::new().with(ProviderId::OpenAI, stored_key)),
        prompt.clone(),
    );
    let orchestrator = SynthesisOrchestrator::new(Arc::new(registry), resolver);

    let (surface, endpoint) = channel_surface();
    let session = PlaybackSession::new(Box::new(surface), temp_dir);
    let options = SpeechOptions {
        provider: ProviderId::OpenAI,
        voice: "nova".into(),
        speed: 1.0,
        max_chars: 50,
    };

    Harness {
        controller: SpeechController::new(orchestrator, session, downloads, options),
        endpoint,
        prompt,
    }
}

fn counter() -> (Arc<AtomicUsize>, StopCallback) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    (
        count,
        Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

async fn expect_load(endpoint: &mut SurfaceEndpoint) -> PathBuf {
    match endpoint.recv().await {
        Some(SurfaceRequest::Load { audio }) => audio,
        other => panic!("expected load, got {other:?}"),
    }
}

#[tokio::test]
async fn test_hello_world_plays_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SPEECH_PATH))
        .and(body_partial_json(json!({ "input": "Hello world", "voice": "nova" })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3_silence(3).to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(
        &server,
        dir.path(),
        "sk-test",
        ScriptedPrompt::new(false),
        fixed_download(None),
    );
    let (stops, on_stop) = counter();

    assert_eq!(h.controller.session().state(), PlaybackState::Idle);
    let outcome = h
        .controller
        .speak("Hello world", &CancellationToken::new(), on_stop)
        .await
        .unwrap();
    assert_eq!(outcome, SpeakOutcome::Playing);
    assert_eq!(h.controller.session().state(), PlaybackState::Loading);

    let audio = expect_load(&mut h.endpoint).await;
    assert_eq!(std::fs::read(&audio).unwrap(), mp3_silence(3).to_vec());

    h.endpoint.send(ControlMessage::Ready).unwrap();
    assert!(h.controller.process_next_event().await);
    assert_eq!(h.controller.session().state(), PlaybackState::Playing);

    h.endpoint.send(ControlMessage::Ended).unwrap();
    h.controller.run_until_idle().await;

    assert_eq!(h.controller.session().state(), PlaybackState::Idle);
    assert!(!audio.exists());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_key_replaced_and_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer sk-expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid API key" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer sk-fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3_silence(2).to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(
        &server,
        dir.path(),
        "sk-expired",
        ScriptedPrompt::new(true).answer("sk-fresh"),
        fixed_download(None),
    );

    let outcome = h
        .controller
        .speak("Hello world", &CancellationToken::new(), Box::new(|| {}))
        .await
        .unwrap();
    assert_eq!(outcome, SpeakOutcome::Playing);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(h.prompt.confirmation_count(), 1);

    let audio = expect_load(&mut h.endpoint).await;
    assert_eq!(std::fs::read(&audio).unwrap(), mp3_silence(2).to_vec());
}

#[tokio::test]
async fn test_declined_reentry_surfaces_auth_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(
        &server,
        dir.path(),
        "sk-secret-value",
        ScriptedPrompt::new(false),
        fixed_download(None),
    );

    let error = h
        .controller
        .speak("Hello world", &CancellationToken::new(), Box::new(|| {}))
        .await
        .unwrap_err();

    let message = error.user_message();
    assert!(message.contains("rejected the credential"), "{message}");
    assert!(!message.contains("sk-secret-value"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(h.controller.session().state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_text_over_bound_makes_no_calls() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(
        &server,
        dir.path(),
        "sk-test",
        ScriptedPrompt::new(false),
        fixed_download(None),
    );

    let long = "x".repeat(51);
    let error = h
        .controller
        .speak(&long, &CancellationToken::new(), Box::new(|| {}))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        AppError::Validation(ValidationError::TextTooLong { len: 51, max: 50 })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(h.prompt.request_count(), 0);
}

#[tokio::test]
async fn test_download_request_saves_copy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3_silence(2).to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("keep.mp3");
    let mut h = harness(
        &server,
        dir.path(),
        "sk-test",
        ScriptedPrompt::new(false),
        fixed_download(Some(dest.clone())),
    );

    h.controller
        .speak("Hello world", &CancellationToken::new(), Box::new(|| {}))
        .await
        .unwrap();
    expect_load(&mut h.endpoint).await;
    h.endpoint.send(ControlMessage::Ready).unwrap();
    h.endpoint.send_wire(r#"{"command":"download"}"#).unwrap();

    assert!(h.controller.process_next_event().await);
    assert!(h.controller.process_next_event().await);

    assert_eq!(std::fs::read(&dest).unwrap(), mp3_silence(2).to_vec());
    assert_eq!(h.controller.session().state(), PlaybackState::Playing);
}

#[tokio::test]
async fn test_failed_download_does_not_interrupt_playback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3_silence(2).to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let unwritable = dir.path().join("missing-dir").join("keep.mp3");
    let mut h = harness(
        &server,
        dir.path(),
        "sk-test",
        ScriptedPrompt::new(false),
        fixed_download(Some(unwritable.clone())),
    );
    let (stops, on_stop) = counter();

    h.controller
        .speak("Hello world", &CancellationToken::new(), on_stop)
        .await
        .unwrap();
    let audio = expect_load(&mut h.endpoint).await;
    h.endpoint.send(ControlMessage::Ready).unwrap();
    h.endpoint.send_wire(r#"{"command":"download"}"#).unwrap();

    let ready = h.controller.next_event().await.unwrap();
    h.controller.process_event(ready).await;
    let download = h.controller.next_event().await.unwrap();
    let report = h.controller.process_event(download).await;
    assert!(matches!(
        report,
        EventReport::DownloadFailed(AppError::Playback(PlaybackError::Save(_)))
    ));
    assert!(!unwritable.exists());
    assert_eq!(h.controller.session().state(), PlaybackState::Playing);

    h.endpoint.send_wire(r#"{"command":"ended"}"#).unwrap();
    h.controller.run_until_idle().await;

    assert_eq!(h.controller.session().state(), PlaybackState::Idle);
    assert!(!audio.exists());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_speak_replaces_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mp3_silence(1).to_vec()))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(
        &server,
        dir.path(),
        "sk-test",
        ScriptedPrompt::new(false),
        fixed_download(None),
    );
    let (first_stops, first) = counter();

    h.controller
        .speak("First", &CancellationToken::new(), first)
        .await
        .unwrap();
    let first_audio = expect_load(&mut h.endpoint).await;

    h.controller
        .speak("Second", &CancellationToken::new(), Box::new(|| {}))
        .await
        .unwrap();

    assert_eq!(first_stops.load(Ordering::SeqCst), 1);
    assert!(!first_audio.exists());
    assert_eq!(h.controller.session().state(), PlaybackState::Loading);

    h.controller.dispose();
    assert!(h.controller.session().is_disposed());
}
