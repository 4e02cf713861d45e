use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, info};

use shared::domain::NotificationId;

pub const NOTIFICATIONS_TABLE: &str = "notifications";
const NOTIFICATION_COLUMNS: [&str; 6] = [
    "id",
    "recipient",
    "title",
    "body",
    "created_at",
    "sent_at",
];

/// The live database does not match the migrated schema. Serving code treats
/// this as a fatal configuration error; it never alters the schema itself.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table '{table}' does not exist; run migrations before dispatching")]
    MissingTable { table: String },
    #[error("table '{table}' is missing columns {columns:?}; run migrations before dispatching")]
    MissingColumns { table: String, columns: Vec<String> },
    #[error("failed to inspect schema: {0}")]
    Inspect(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNotification {
    pub id: NotificationId,
    pub recipient: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Storage {
    /// Opens the database and applies pending migrations. This is the deploy
    /// step; request-serving code should use [`Storage::connect`].
    pub async fn new(database_url: &str) -> Result<Self> {
        let storage = Self::connect(database_url).await?;
        storage.migrate().await?;
        Ok(storage)
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url '{database_url}'"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open database '{database_url}'"))?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to apply migrations")?;
        info!("storage: migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn verify_schema(&self) -> std::result::Result<(), SchemaError> {
        let rows = sqlx::query("PRAGMA table_info(notifications)")
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Err(SchemaError::MissingTable {
                table: NOTIFICATIONS_TABLE.to_string(),
            });
        }

        let mut present = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            present.push(name);
        }

        let missing: Vec<String> = NOTIFICATION_COLUMNS
            .iter()
            .filter(|column| !present.iter().any(|name| name == *column))
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns {
                table: NOTIFICATIONS_TABLE.to_string(),
                columns: missing,
            });
        }

        debug!("storage: schema verified table={NOTIFICATIONS_TABLE}");
        Ok(())
    }

    pub async fn enqueue_notification(
        &self,
        recipient: &str,
        title: &str,
        body: &str,
    ) -> Result<NotificationId> {
        let result = sqlx::query(
            "INSERT INTO notifications (recipient, title, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(recipient)
        .bind(title)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to enqueue notification")?;
        Ok(NotificationId(result.last_insert_rowid()))
    }

    /// Oldest unsent notifications first.
    pub async fn fetch_unsent(&self, limit: u32) -> Result<Vec<StoredNotification>> {
        let rows = sqlx::query(
            "SELECT id, recipient, title, body, created_at, sent_at
             FROM notifications
             WHERE sent_at IS NULL
             ORDER BY created_at ASC, id ASC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .context("failed to load unsent notifications")?;

        rows.iter().map(notification_from_row).collect()
    }

    pub async fn notification(&self, id: NotificationId) -> Result<Option<StoredNotification>> {
        let row = sqlx::query(
            "SELECT id, recipient, title, body, created_at, sent_at
             FROM notifications
             WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load notification {}", id.0))?;

        row.as_ref().map(notification_from_row).transpose()
    }

    /// Returns `false` when the row was already marked or does not exist.
    pub async fn mark_sent(&self, id: NotificationId) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET sent_at = ? WHERE id = ? AND sent_at IS NULL")
                .bind(Utc::now())
                .bind(id.0)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to mark notification {} sent", id.0))?;
        Ok(result.rows_affected() == 1)
    }
}

fn notification_from_row(row: &SqliteRow) -> Result<StoredNotification> {
    Ok(StoredNotification {
        id: NotificationId(row.try_get("id")?),
        recipient: row.try_get("recipient")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        sent_at: row.try_get("sent_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
