use std::sync::Arc;

use audio_integration::{AudioAssetProvider, AudioError, AudioEvent, AudioHandle, AudioRequest};
use serde::Serialize;
use shared::{
    domain::{DurationId, GuideId, MeditationId},
    mysteries::Meditation,
};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::steps::{build_steps, PrayerStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Result of a relative navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved { index: usize },
    Unchanged,
    /// `next()` at the final step. The index is left alone; the caller hands
    /// off to the following meditation.
    SessionComplete,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("step index {index} is out of range for {len} steps")]
    OutOfRange { index: usize, len: usize },
    #[error("playback failed: {0}")]
    Playback(#[from] AudioError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started {
        session_id: Uuid,
        meditation: MeditationId,
    },
    StepChanged {
        index: usize,
    },
    PlaybackChanged(PlaybackStatus),
    SessionComplete,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub meditation: MeditationId,
    pub meditation_title: &'static str,
    pub step_index: usize,
    pub step_count: usize,
    pub step: PrayerStep,
    pub status: PlaybackStatus,
    pub guide: GuideId,
    pub duration: DurationId,
    pub show_full_text: bool,
}

struct SessionState {
    session_id: Uuid,
    meditation: &'static Meditation,
    steps: Vec<PrayerStep>,
    current_step_index: usize,
    guide: GuideId,
    duration: DurationId,
    status: PlaybackStatus,
    show_full_text: bool,
}

impl SessionState {
    fn new(meditation: &'static Meditation, guide: GuideId, duration: DurationId) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            meditation,
            steps: build_steps(meditation),
            current_step_index: 0,
            guide,
            duration,
            status: PlaybackStatus::Idle,
            show_full_text: false,
        }
    }

    fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

struct ActivePlayback {
    handle: Arc<dyn AudioHandle>,
    events: broadcast::Receiver<AudioEvent>,
}

/// Walks one meditation's prayer steps and owns at most one audio handle.
///
/// Every navigation releases the held handle before the index moves, so the
/// audio never lags behind the displayed step.
pub struct PrayerSessionController {
    audio: Arc<dyn AudioAssetProvider>,
    state: SessionState,
    playback: Option<ActivePlayback>,
    events: broadcast::Sender<SessionEvent>,
}

impl PrayerSessionController {
    pub fn start(
        audio: Arc<dyn AudioAssetProvider>,
        meditation: &'static Meditation,
        guide: GuideId,
        duration: DurationId,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let controller = Self {
            audio,
            state: SessionState::new(meditation, guide, duration),
            playback: None,
            events,
        };
        controller.announce_start();
        controller
    }

    /// Switches to another meditation, tearing down any playback first.
    pub async fn restart(
        &mut self,
        meditation: &'static Meditation,
        guide: GuideId,
        duration: DurationId,
    ) {
        self.stop().await;
        self.state = SessionState::new(meditation, guide, duration);
        self.announce_start();
    }

    pub async fn close(mut self) {
        self.stop().await;
        debug!("rosary: session closed id={}", self.state.session_id);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn session_id(&self) -> Uuid {
        self.state.session_id
    }

    pub fn meditation(&self) -> &'static Meditation {
        self.state.meditation
    }

    pub fn steps(&self) -> &[PrayerStep] {
        &self.state.steps
    }

    pub fn current_step_index(&self) -> usize {
        self.state.current_step_index
    }

    pub fn current_step(&self) -> &PrayerStep {
        &self.state.steps[self.state.current_step_index]
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn guide(&self) -> &GuideId {
        &self.state.guide
    }

    pub fn duration(&self) -> &DurationId {
        &self.state.duration
    }

    pub fn show_full_text(&self) -> bool {
        self.state.show_full_text
    }

    pub fn has_audio_handle(&self) -> bool {
        self.playback.is_some()
    }

    pub fn toggle_full_text(&mut self) -> bool {
        self.state.show_full_text = !self.state.show_full_text;
        self.state.show_full_text
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.state.session_id,
            meditation: self.state.meditation.id,
            meditation_title: self.state.meditation.title,
            step_index: self.state.current_step_index,
            step_count: self.state.steps.len(),
            step: self.current_step().clone(),
            status: self.state.status,
            guide: self.state.guide.clone(),
            duration: self.state.duration.clone(),
            show_full_text: self.state.show_full_text,
        }
    }

    pub async fn next(&mut self) -> StepOutcome {
        self.stop().await;
        if self.state.current_step_index >= self.state.last_index() {
            info!(
                "rosary: session complete id={} meditation={}",
                self.state.session_id, self.state.meditation.id
            );
            let _ = self.events.send(SessionEvent::SessionComplete);
            return StepOutcome::SessionComplete;
        }
        self.move_to(self.state.current_step_index + 1)
    }

    pub async fn previous(&mut self) -> StepOutcome {
        self.stop().await;
        if self.state.current_step_index == 0 {
            return StepOutcome::Unchanged;
        }
        self.move_to(self.state.current_step_index - 1)
    }

    /// Rejected targets leave the session untouched, playback included.
    pub async fn jump_to(&mut self, index: usize) -> Result<StepOutcome, SessionError> {
        let len = self.state.steps.len();
        if index >= len {
            return Err(SessionError::OutOfRange { index, len });
        }
        self.stop().await;
        Ok(self.move_to(index))
    }

    pub async fn toggle_playback(&mut self) -> Result<PlaybackStatus, SessionError> {
        self.sync_playback().await;
        match (self.state.status, self.current_handle()) {
            (PlaybackStatus::Idle, _) | (_, None) => self.begin_playback().await?,
            (PlaybackStatus::Playing, Some(handle)) => {
                if let Err(err) = handle.pause().await {
                    warn!("audio: pause failed session={} error={err}", self.state.session_id);
                    self.stop().await;
                    return Err(err.into());
                }
                self.set_status(PlaybackStatus::Paused);
            }
            (PlaybackStatus::Paused, Some(handle)) => {
                if let Err(err) = handle.resume().await {
                    warn!("audio: resume failed session={} error={err}", self.state.session_id);
                    self.stop().await;
                    return Err(err.into());
                }
                self.set_status(PlaybackStatus::Playing);
            }
        }
        Ok(self.state.status)
    }

    pub async fn change_guide(&mut self, guide: GuideId) {
        if self.state.status != PlaybackStatus::Idle {
            self.stop().await;
        }
        debug!("rosary: guide changed session={} guide={guide}", self.state.session_id);
        self.state.guide = guide;
    }

    pub async fn change_duration(&mut self, duration: DurationId) {
        if self.state.status != PlaybackStatus::Idle {
            self.stop().await;
        }
        debug!(
            "rosary: duration changed session={} duration={duration}",
            self.state.session_id
        );
        self.state.duration = duration;
    }

    /// Releases the held handle, if any. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        if let Some(active) = self.playback.take() {
            if let Err(err) = active.handle.release().await {
                warn!(
                    "audio: release failed session={} asset={} error={err}",
                    self.state.session_id,
                    active.handle.asset_key()
                );
            }
        }
        self.set_status(PlaybackStatus::Idle);
    }

    /// Drains pending completion signals without waiting. Natural completion
    /// returns the session to idle; it never advances the step.
    pub async fn sync_playback(&mut self) -> PlaybackStatus {
        let session_id = self.state.session_id;
        let mut finished = false;
        if let Some(active) = self.playback.as_mut() {
            loop {
                match active.events.try_recv() {
                    Ok(event) => {
                        log_audio_event(session_id, &event);
                        finished = true;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Lagged(skipped)) => {
                        debug!("audio: lagged events skipped={skipped}");
                    }
                    Err(TryRecvError::Closed) => {
                        finished = true;
                        break;
                    }
                }
            }
        }
        if finished {
            self.stop().await;
        }
        self.state.status
    }

    /// Waits until the current track ends. Returns immediately unless playing.
    pub async fn wait_for_playback_end(&mut self) -> PlaybackStatus {
        if self.state.status != PlaybackStatus::Playing {
            return self.state.status;
        }
        let session_id = self.state.session_id;
        if let Some(active) = self.playback.as_mut() {
            loop {
                match active.events.recv().await {
                    Ok(event) => {
                        log_audio_event(session_id, &event);
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("audio: lagged events skipped={skipped}");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
        self.stop().await;
        self.state.status
    }

    async fn begin_playback(&mut self) -> Result<(), SessionError> {
        // Never hold two handles at once.
        self.stop().await;

        let request = AudioRequest {
            meditation: self.state.meditation.id,
            guide: self.state.guide.clone(),
            duration: self.state.duration.clone(),
        };
        let handle = self.audio.resolve(&request).await.map_err(|err| {
            warn!(
                "audio: resolve failed session={} asset={} error={err}",
                self.state.session_id,
                request.asset_key()
            );
            SessionError::Playback(err)
        })?;

        let events = handle.subscribe_events();
        if let Err(err) = handle.play().await {
            warn!(
                "audio: play failed session={} asset={} error={err}",
                self.state.session_id,
                handle.asset_key()
            );
            if let Err(release_err) = handle.release().await {
                warn!("audio: release after failed play errored: {release_err}");
            }
            return Err(err.into());
        }

        info!(
            "audio: playing session={} asset={}",
            self.state.session_id,
            handle.asset_key()
        );
        self.playback = Some(ActivePlayback { handle, events });
        self.set_status(PlaybackStatus::Playing);
        Ok(())
    }

    fn current_handle(&self) -> Option<Arc<dyn AudioHandle>> {
        self.playback
            .as_ref()
            .map(|active| Arc::clone(&active.handle))
    }

    fn move_to(&mut self, index: usize) -> StepOutcome {
        self.state.current_step_index = index;
        self.state.show_full_text = false;
        debug!(
            "rosary: step changed session={} index={index}",
            self.state.session_id
        );
        let _ = self.events.send(SessionEvent::StepChanged { index });
        StepOutcome::Moved { index }
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.state.status == status {
            return;
        }
        self.state.status = status;
        let _ = self.events.send(SessionEvent::PlaybackChanged(status));
    }

    fn announce_start(&self) {
        info!(
            "rosary: session started id={} meditation={} guide={} duration={}",
            self.state.session_id,
            self.state.meditation.id,
            self.state.guide,
            self.state.duration
        );
        let _ = self.events.send(SessionEvent::Started {
            session_id: self.state.session_id,
            meditation: self.state.meditation.id,
        });
    }
}

fn log_audio_event(session_id: Uuid, event: &AudioEvent) {
    match event {
        AudioEvent::Finished => info!("audio: finished session={session_id}"),
        AudioEvent::Interrupted { reason } => {
            warn!("audio: interrupted session={session_id} reason={reason}")
        }
    }
}

impl Drop for PrayerSessionController {
    fn drop(&mut self) {
        let Some(active) = self.playback.take() else {
            return;
        };
        warn!(
            "rosary: session dropped while holding audio session={} asset={}",
            self.state.session_id,
            active.handle.asset_key()
        );
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = active.handle.release().await;
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
