use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::NotificationId,
    error::{ErrorCode, ErrorPayload},
};
use storage::{SchemaError, Storage, StoredNotification};
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_BATCH_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub notification_id: NotificationId,
    pub recipient: String,
    pub title: String,
    pub body: String,
}

impl From<StoredNotification> for PushMessage {
    fn from(value: StoredNotification) -> Self {
        Self {
            notification_id: value.id,
            recipient: value.recipient,
            title: value.title,
            body: value.body,
        }
    }
}

/// Delivery seam for the external push service.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<()>;
}

/// Logs each message instead of delivering it.
pub struct LoggingPushSender;

#[async_trait]
impl PushSender for LoggingPushSender {
    async fn send(&self, message: &PushMessage) -> anyhow::Result<()> {
        info!(
            "push: dry-run notification={} recipient={} title={:?}",
            message.notification_id.0, message.recipient, message.title
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notification schema mismatch: {0}")]
    Schema(#[from] SchemaError),
    #[error("notification store failure: {0:#}")]
    Store(anyhow::Error),
}

impl DispatchError {
    pub fn payload(&self) -> ErrorPayload {
        let code = match self {
            DispatchError::Schema(_) => ErrorCode::Schema,
            DispatchError::Store(_) => ErrorCode::Internal,
        };
        ErrorPayload::new(code, self.to_string())
    }
}

/// Sends one batch of unsent notifications.
///
/// A schema mismatch aborts before anything is sent. Individual push failures
/// are counted and left unsent for the next pass.
pub async fn dispatch_pending(
    storage: &Storage,
    push: &dyn PushSender,
    batch_size: u32,
) -> Result<DispatchReport, DispatchError> {
    if let Err(err) = storage.verify_schema().await {
        error!("notify: refusing to dispatch, {err}");
        return Err(err.into());
    }

    let pending = storage
        .fetch_unsent(batch_size)
        .await
        .map_err(DispatchError::Store)?;

    let mut report = DispatchReport {
        attempted: pending.len(),
        ..DispatchReport::default()
    };

    for notification in pending {
        let message = PushMessage::from(notification);
        if let Err(err) = push.send(&message).await {
            warn!(
                "notify: push failed notification={} recipient={} error={err:#}",
                message.notification_id.0, message.recipient
            );
            report.failed += 1;
            continue;
        }

        let marked = storage
            .mark_sent(message.notification_id)
            .await
            .map_err(DispatchError::Store)?;
        if !marked {
            warn!(
                "notify: notification={} was already marked sent",
                message.notification_id.0
            );
        }
        report.sent += 1;
    }

    info!(
        "notify: dispatch finished attempted={} sent={} failed={}",
        report.attempted, report.sent, report.failed
    );
    Ok(report)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
