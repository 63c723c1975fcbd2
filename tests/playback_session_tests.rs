//! Playback session lifecycle tests over the in-process channel surface
//!
//! These tests verify:
//! - State transitions driven by surface events
//! - Single temp resource and on_stop accounting across replacement
//! - Observer notifications at the idle/active boundary only
//! - Download copies, late events and surface loss

mod fixtures;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use fixtures::{mp3_silence, wav_tone};
use speak_selection::core::playback::{
    PlaybackSession, PlaybackState, StatusObserver, StopCallback, SurfaceEndpoint,
    SurfaceRequest, TEMP_FILE_PREFIX, channel_surface,
};
use speak_selection::{ControlMessage, EventOutcome, PlaybackError};

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

#[derive(Default)]
struct Recorder {
    statuses: Mutex<Vec<bool>>,
}

impl StatusObserver for Recorder {
    fn on_status(&self, active: bool) {
        self.statuses.lock().push(active);
    }
}

fn temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(TEMP_FILE_PREFIX))
        .collect()
}

fn session(dir: &Path) -> (PlaybackSession, SurfaceEndpoint) {
    let (surface, endpoint) = channel_surface();
    (PlaybackSession::new(Box::new(surface), dir), endpoint)
}

/// Receive requests until the next load and acknowledge it with `ready`.
async fn acknowledge_load(endpoint: &mut SurfaceEndpoint) {
    loop {
        match endpoint.recv().await {
            Some(SurfaceRequest::Load { .. }) => break,
            Some(_) => continue,
            None => panic!("surface closed before load"),
        }
    }
    assert!(endpoint.send(ControlMessage::Ready).unwrap());
}

#[tokio::test]
async fn test_full_lifecycle_to_natural_end() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());
    let (stops, on_stop) = counter();

    session.play(mp3_silence(4), on_stop).await.unwrap();
    assert_eq!(session.state(), PlaybackState::Loading);
    let path = session.audio_path().unwrap().to_path_buf();
    assert_eq!(path.extension().unwrap(), "mp3");
    assert_eq!(std::fs::read(&path).unwrap(), mp3_silence(4).to_vec());

    acknowledge_load(&mut endpoint).await;
    let ready = session.next_event().await.unwrap();
    assert_eq!(session.handle_event(ready), EventOutcome::Handled);
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(
        endpoint.recv().await,
        Some(SurfaceRequest::Control(ControlMessage::Play))
    );

    session.pause();
    assert_eq!(session.state(), PlaybackState::Paused);
    session.resume();
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(
        endpoint.recv().await,
        Some(SurfaceRequest::Control(ControlMessage::Pause))
    );
    assert_eq!(
        endpoint.recv().await,
        Some(SurfaceRequest::Control(ControlMessage::Resume))
    );

    assert!(endpoint.send_wire(r#"{"command":"ended"}"#).unwrap());
    let ended = session.next_event().await.unwrap();
    session.handle_event(ended);

    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(!path.exists());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wav_audio_gets_wav_extension() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _endpoint) = session(dir.path());

    session.play(wav_tone(), Box::new(|| {})).await.unwrap();
    assert_eq!(session.audio_path().unwrap().extension().unwrap(), "wav");
}

#[tokio::test]
async fn test_play_twice_leaves_one_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, _endpoint) = session(dir.path());
    let (first_stops, first) = counter();
    let (second_stops, second) = counter();

    session.play(mp3_silence(1), first).await.unwrap();
    session.play(mp3_silence(2), second).await.unwrap();

    assert_eq!(temp_files(dir.path()).len(), 1);
    assert_eq!(first_stops.load(Ordering::SeqCst), 1);
    assert_eq!(second_stops.load(Ordering::SeqCst), 0);
    assert_eq!(session.state(), PlaybackState::Loading);

    session.stop();
    assert!(temp_files(dir.path()).is_empty());
    assert_eq!(second_stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stop_when_idle_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());
    let recorder = Arc::new(Recorder::default());
    session.add_observer(recorder.clone());

    session.stop();
    session.stop();

    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(recorder.statuses.lock().is_empty());
    assert!(endpoint.try_recv().is_none());
}

#[tokio::test]
async fn test_observer_notified_once_per_boundary_change() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());
    let recorder = Arc::new(Recorder::default());
    session.add_observer(recorder.clone());

    session.play(mp3_silence(1), Box::new(|| {})).await.unwrap();
    acknowledge_load(&mut endpoint).await;
    let ready = session.next_event().await.unwrap();
    session.handle_event(ready);
    session.pause();
    session.resume();
    // Replacement stays active
    session.play(mp3_silence(1), Box::new(|| {})).await.unwrap();
    session.stop();

    assert_eq!(*recorder.statuses.lock(), vec![true, false]);
}

#[tokio::test]
async fn test_unwritable_temp_dir_leaves_session_idle() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(&dir.path().join("does-not-exist"));
    let recorder = Arc::new(Recorder::default());
    session.add_observer(recorder.clone());
    let (stops, on_stop) = counter();

    assert!(matches!(
        session.play(mp3_silence(1), on_stop).await,
        Err(PlaybackError::Resource(_))
    ));
    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(session.audio_path().is_none());
    assert!(recorder.statuses.lock().is_empty());
    assert_eq!(stops.load(Ordering::SeqCst), 0);
    assert!(endpoint.try_recv().is_none());
}

#[tokio::test]
async fn test_temp_write_failure_on_replacement_releases_previous() {
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("staging");
    std::fs::create_dir(&staging).unwrap();
    let (mut session, _endpoint) = session(&staging);
    let recorder = Arc::new(Recorder::default());
    session.add_observer(recorder.clone());
    let (first_stops, first) = counter();
    let (second_stops, second) = counter();

    session.play(mp3_silence(1), first).await.unwrap();
    std::fs::remove_dir_all(&staging).unwrap();

    assert!(matches!(
        session.play(mp3_silence(2), second).await,
        Err(PlaybackError::Resource(_))
    ));
    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(session.audio_path().is_none());
    assert_eq!(first_stops.load(Ordering::SeqCst), 1);
    assert_eq!(second_stops.load(Ordering::SeqCst), 0);
    assert_eq!(*recorder.statuses.lock(), vec![true, false]);

    // Stop on the now idle session does nothing more
    session.stop();
    assert_eq!(first_stops.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.statuses.lock().len(), 2);
}

#[tokio::test]
async fn test_download_copies_without_state_change() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());

    session.play(mp3_silence(3), Box::new(|| {})).await.unwrap();
    acknowledge_load(&mut endpoint).await;
    let ready = session.next_event().await.unwrap();
    session.handle_event(ready);

    assert!(endpoint.send(ControlMessage::DownloadRequested).unwrap());
    let download = session.next_event().await.unwrap();
    assert_eq!(session.handle_event(download), EventOutcome::DownloadRequested);

    let dest = dir.path().join("saved.mp3");
    let copied = session.save_audio(&dest).await.unwrap();
    assert_eq!(copied as usize, mp3_silence(3).len());
    assert_eq!(std::fs::read(&dest).unwrap(), mp3_silence(3).to_vec());
    assert_eq!(session.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn test_save_without_session_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _endpoint) = session(dir.path());
    assert!(matches!(
        session.save_audio(&dir.path().join("x.mp3")).await,
        Err(PlaybackError::NothingToSave)
    ));
}

#[tokio::test]
async fn test_late_events_from_replaced_session_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());

    session.play(mp3_silence(1), Box::new(|| {})).await.unwrap();
    // Endpoint sees the first load only
    assert!(matches!(
        endpoint.recv().await,
        Some(SurfaceRequest::Load { .. })
    ));

    session.play(mp3_silence(2), Box::new(|| {})).await.unwrap();

    // The renderer still believes the first session is current
    assert!(!endpoint.send(ControlMessage::Ended).unwrap());

    acknowledge_load(&mut endpoint).await;
    let event = session.next_event().await.unwrap();
    assert_eq!(event, ControlMessage::Ready);
    session.handle_event(event);
    assert_eq!(session.state(), PlaybackState::Playing);
}

#[tokio::test]
async fn test_dispose_then_play_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());
    let (stops, on_stop) = counter();

    session.play(mp3_silence(1), on_stop).await.unwrap();
    session.dispose();
    assert!(session.is_disposed());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert!(temp_files(dir.path()).is_empty());

    let mut saw_destroy = false;
    while let Some(request) = endpoint.try_recv() {
        saw_destroy |= request == SurfaceRequest::Destroy;
    }
    assert!(saw_destroy);

    assert!(matches!(
        session.play(mp3_silence(1), Box::new(|| {})).await,
        Err(PlaybackError::SurfaceDisposed)
    ));
    assert_eq!(session.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_surface_closed_releases_session() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());
    let (stops, on_stop) = counter();

    session.play(mp3_silence(1), on_stop).await.unwrap();
    acknowledge_load(&mut endpoint).await;
    let ready = session.next_event().await.unwrap();
    session.handle_event(ready);
    let path = session.audio_path().unwrap().to_path_buf();

    // Renderer goes away mid-playback
    drop(endpoint);
    assert_eq!(session.next_event().await, None);

    assert_eq!(session.state(), PlaybackState::Idle);
    assert!(!path.exists());
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    // The next session cannot reach a renderer
    assert!(matches!(
        session.play(mp3_silence(1), Box::new(|| {})).await,
        Err(PlaybackError::Surface(_))
    ));
    assert!(temp_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_malformed_wire_event_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, mut endpoint) = session(dir.path());

    session.play(mp3_silence(1), Box::new(|| {})).await.unwrap();
    endpoint.recv().await;

    assert!(matches!(
        endpoint.send_wire(r#"{"command":"seek"}"#),
        Err(PlaybackError::Surface(_))
    ));
    assert!(endpoint.send_wire("not json").is_err());
    assert_eq!(session.state(), PlaybackState::Loading);
}
