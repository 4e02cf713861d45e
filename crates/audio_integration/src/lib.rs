use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shared::domain::{DurationId, GuideId, MeditationId};
use thiserror::Error;
use tokio::sync::broadcast;

mod simulated;

pub use simulated::{SimulatedAudioHandle, SimulatedAudioProvider};

/// What the session wants to hear: one asset per meditation, voiced by a guide
/// at a chosen length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioRequest {
    pub meditation: MeditationId,
    pub guide: GuideId,
    pub duration: DurationId,
}

impl AudioRequest {
    pub fn asset_key(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.meditation.category.slug(),
            self.meditation.ordinal + 1,
            self.guide,
            self.duration
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Finished,
    Interrupted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio asset not found: {0}")]
    NotFound(String),
    #[error("audio device is busy")]
    Busy,
    #[error("audio handle already released")]
    Released,
    #[error("audio backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AudioHandle: Send + Sync {
    fn asset_key(&self) -> &str;
    async fn play(&self) -> Result<(), AudioError>;
    async fn pause(&self) -> Result<(), AudioError>;
    async fn resume(&self) -> Result<(), AudioError>;
    async fn release(&self) -> Result<(), AudioError>;
    fn subscribe_events(&self) -> broadcast::Receiver<AudioEvent>;
}

#[async_trait]
pub trait AudioAssetProvider: Send + Sync {
    async fn resolve(&self, request: &AudioRequest) -> Result<Arc<dyn AudioHandle>, AudioError>;
}

pub struct MissingAudioProvider;

#[async_trait]
impl AudioAssetProvider for MissingAudioProvider {
    async fn resolve(&self, request: &AudioRequest) -> Result<Arc<dyn AudioHandle>, AudioError> {
        Err(AudioError::Backend(format!(
            "audio provider is unavailable for asset {}",
            request.asset_key()
        )))
    }
}

#[cfg(test)]
#[path = "tests/simulated_tests.rs"]
mod tests;
