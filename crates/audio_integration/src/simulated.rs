use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::domain::DurationId;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::Instant,
};
use tracing::debug;

use crate::{AudioAssetProvider, AudioError, AudioEvent, AudioHandle, AudioRequest};

/// Headless provider that "plays" a track by sleeping for its length.
///
/// Only durations registered with [`SimulatedAudioProvider::with_track_length`]
/// resolve; anything else is reported as a missing asset.
#[derive(Debug, Default, Clone)]
pub struct SimulatedAudioProvider {
    track_lengths: HashMap<DurationId, Duration>,
}

impl SimulatedAudioProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track_length(mut self, duration: DurationId, length: Duration) -> Self {
        self.track_lengths.insert(duration, length);
        self
    }
}

#[async_trait]
impl AudioAssetProvider for SimulatedAudioProvider {
    async fn resolve(&self, request: &AudioRequest) -> Result<Arc<dyn AudioHandle>, AudioError> {
        let asset_key = request.asset_key();
        let length = self
            .track_lengths
            .get(&request.duration)
            .copied()
            .ok_or_else(|| AudioError::NotFound(asset_key.clone()))?;
        debug!("audio: resolved simulated asset={asset_key} length_ms={}", length.as_millis());
        Ok(Arc::new(SimulatedAudioHandle::new(asset_key, length)))
    }
}

enum Phase {
    Ready,
    Playing {
        resumed_at: Instant,
        remaining: Duration,
        timer: JoinHandle<()>,
    },
    Paused {
        remaining: Duration,
    },
    Finished,
    Released,
}

pub struct SimulatedAudioHandle {
    asset_key: String,
    length: Duration,
    phase: Arc<Mutex<Phase>>,
    events: broadcast::Sender<AudioEvent>,
}

impl SimulatedAudioHandle {
    pub fn new(asset_key: impl Into<String>, length: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            asset_key: asset_key.into(),
            length,
            phase: Arc::new(Mutex::new(Phase::Ready)),
            events,
        }
    }

    pub async fn is_released(&self) -> bool {
        matches!(*self.phase.lock().await, Phase::Released)
    }

    pub async fn is_playing(&self) -> bool {
        matches!(*self.phase.lock().await, Phase::Playing { .. })
    }

    fn spawn_timer(&self, remaining: Duration) -> JoinHandle<()> {
        let phase = Arc::clone(&self.phase);
        let events = self.events.clone();
        let asset_key = self.asset_key.clone();
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut guard = phase.lock().await;
            if matches!(*guard, Phase::Playing { .. }) {
                *guard = Phase::Finished;
                debug!("audio: simulated track finished asset={asset_key}");
                let _ = events.send(AudioEvent::Finished);
            }
        })
    }

    fn playing(&self, remaining: Duration) -> Phase {
        Phase::Playing {
            resumed_at: Instant::now(),
            remaining,
            timer: self.spawn_timer(remaining),
        }
    }
}

#[async_trait]
impl AudioHandle for SimulatedAudioHandle {
    fn asset_key(&self) -> &str {
        &self.asset_key
    }

    async fn play(&self) -> Result<(), AudioError> {
        let mut phase = self.phase.lock().await;
        match &*phase {
            Phase::Ready | Phase::Finished => {
                *phase = self.playing(self.length);
                Ok(())
            }
            Phase::Paused { remaining } => {
                let remaining = *remaining;
                *phase = self.playing(remaining);
                Ok(())
            }
            Phase::Playing { .. } => Ok(()),
            Phase::Released => Err(AudioError::Released),
        }
    }

    async fn pause(&self) -> Result<(), AudioError> {
        let mut phase = self.phase.lock().await;
        match &*phase {
            Phase::Playing {
                resumed_at,
                remaining,
                timer,
            } => {
                timer.abort();
                let remaining = remaining.saturating_sub(resumed_at.elapsed());
                *phase = Phase::Paused { remaining };
                Ok(())
            }
            // The track ran out just before the pause landed.
            Phase::Paused { .. } | Phase::Finished => Ok(()),
            Phase::Ready => Err(AudioError::Backend(format!(
                "asset {} is not playing",
                self.asset_key
            ))),
            Phase::Released => Err(AudioError::Released),
        }
    }

    async fn resume(&self) -> Result<(), AudioError> {
        let mut phase = self.phase.lock().await;
        match &*phase {
            Phase::Paused { remaining } => {
                let remaining = *remaining;
                *phase = self.playing(remaining);
                Ok(())
            }
            Phase::Playing { .. } => Ok(()),
            Phase::Ready | Phase::Finished => Err(AudioError::Backend(format!(
                "asset {} is not paused",
                self.asset_key
            ))),
            Phase::Released => Err(AudioError::Released),
        }
    }

    async fn release(&self) -> Result<(), AudioError> {
        let mut phase = self.phase.lock().await;
        if let Phase::Playing { timer, .. } = &*phase {
            timer.abort();
            let _ = self.events.send(AudioEvent::Interrupted {
                reason: "released while playing".into(),
            });
        }
        *phase = Phase::Released;
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<AudioEvent> {
        self.events.subscribe()
    }
}
