use super::*;
use shared::domain::{DurationId, GuideId, MeditationId, MysteryCategory};
use std::time::Duration;

fn request(duration: &str) -> AudioRequest {
    AudioRequest {
        meditation: MeditationId::new(MysteryCategory::Joyful, 1),
        guide: GuideId::new("father-luis"),
        duration: DurationId::new(duration),
    }
}

fn provider() -> SimulatedAudioProvider {
    SimulatedAudioProvider::new().with_track_length(DurationId::new("short"), Duration::from_secs(3))
}

#[test]
fn asset_key_names_meditation_guide_and_duration() {
    assert_eq!(request("short").asset_key(), "joyful/2/father-luis/short");
}

#[tokio::test]
async fn missing_provider_reports_backend_error() {
    let err = MissingAudioProvider
        .resolve(&request("short"))
        .await
        .err()
        .expect("missing provider must fail");
    assert!(matches!(err, AudioError::Backend(_)));
}

#[tokio::test]
async fn unknown_duration_is_not_found() {
    let err = provider()
        .resolve(&request("extended"))
        .await
        .err()
        .expect("unregistered duration");
    assert_eq!(
        err,
        AudioError::NotFound("joyful/2/father-luis/extended".into())
    );
}

#[tokio::test(start_paused = true)]
async fn playback_emits_finished_after_track_length() {
    let handle = provider().resolve(&request("short")).await.expect("resolve");
    let mut events = handle.subscribe_events();

    handle.play().await.expect("play");
    let event = events.recv().await.expect("event");
    assert_eq!(event, AudioEvent::Finished);
}

#[tokio::test(start_paused = true)]
async fn paused_playback_does_not_finish_until_resumed() {
    let handle = SimulatedAudioHandle::new("joyful/1/guide/short", Duration::from_secs(3));
    let mut events = handle.subscribe_events();

    handle.play().await.expect("play");
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.pause().await.expect("pause");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(events.try_recv().is_err());
    assert!(!handle.is_playing().await);

    handle.resume().await.expect("resume");
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(events.try_recv().expect("finished"), AudioEvent::Finished);
}

#[tokio::test(start_paused = true)]
async fn released_handle_rejects_further_playback() {
    let handle = SimulatedAudioHandle::new("joyful/1/guide/short", Duration::from_secs(3));
    let mut events = handle.subscribe_events();

    handle.play().await.expect("play");
    handle.release().await.expect("release");
    handle.release().await.expect("release is idempotent");
    assert!(handle.is_released().await);
    assert_eq!(
        events.try_recv().expect("interrupted"),
        AudioEvent::Interrupted {
            reason: "released while playing".into()
        }
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(handle.play().await, Err(AudioError::Released));
}

#[tokio::test]
async fn pause_before_play_is_rejected() {
    let handle = SimulatedAudioHandle::new("joyful/1/guide/short", Duration::from_secs(3));
    assert!(matches!(handle.pause().await, Err(AudioError::Backend(_))));
}

#[tokio::test(start_paused = true)]
async fn releasing_an_idle_handle_emits_nothing() {
    let handle = SimulatedAudioHandle::new("joyful/1/guide/short", Duration::from_secs(3));
    let mut events = handle.subscribe_events();

    handle.release().await.expect("release");
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn pause_after_natural_finish_is_a_no_op() {
    let handle = SimulatedAudioHandle::new("joyful/1/guide/short", Duration::from_secs(3));
    let mut events = handle.subscribe_events();

    handle.play().await.expect("play");
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(events.try_recv().expect("finished"), AudioEvent::Finished);

    assert_eq!(handle.pause().await, Ok(()));
    assert!(!handle.is_playing().await);
}
