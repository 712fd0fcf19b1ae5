mod model;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{NotificationStorageModel, payload_json, to_millis};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use crate::models::{NewNotification, Notification, NotificationId, NotificationStatus};

use super::notification_storage::{NotificationStorage, Page};

#[derive(Debug, Error)]
pub enum SqliteStorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Could not (de)serialize payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Notification {0} does not exist")]
    NotFound(NotificationId),

    #[error("Invalid notification record: {0}")]
    InvalidRecord(String),
}

/// Opens (creating if needed) the database at `url` and applies the migrations.
pub async fn connect(url: &str) -> Result<sqlx::SqlitePool, SqliteStorageError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Connected to notification database");

    Ok(pool)
}

pub struct SqliteNotificationStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteNotificationStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        status: NotificationStatus,
        page: Page,
    ) -> Result<Vec<Notification>, SqliteStorageError> {
        let rows = sqlx::query_as::<_, NotificationStorageModel>(
            "
SELECT * FROM notifications
WHERE status = ?
ORDER BY created_at DESC, rowid DESC
LIMIT ? OFFSET ?
",
        )
        .bind(status.as_str())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn mark_undecodable_failed(&self, id: &str) -> Result<(), SqliteStorageError> {
        sqlx::query("UPDATE notifications SET status = ?, updated_at = ? WHERE id = ?")
            .bind(NotificationStatus::Failed.as_str())
            .bind(to_millis(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl NotificationStorage for SqliteNotificationStorage {
    type Error = SqliteStorageError;

    async fn insert(&self, notification: NewNotification) -> Result<Notification, Self::Error> {
        let NewNotification {
            recipient,
            payload,
            send_at,
        } = notification;
        let id = NotificationId::new_v4();
        let now = to_millis(Utc::now());

        let created = sqlx::query_as::<_, NotificationStorageModel>(
            "
INSERT INTO notifications (id, recipient, channel, payload, send_at, status, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
RETURNING *
",
        )
        .bind(id.to_string())
        .bind(recipient)
        .bind(payload.channel().as_str())
        .bind(payload_json(&payload)?)
        .bind(to_millis(send_at))
        .bind(NotificationStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        created.try_into()
    }

    async fn get(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error> {
        let row = sqlx::query_as::<_, NotificationStorageModel>(
            "SELECT * FROM notifications WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error> {
        let row = sqlx::query_as::<_, NotificationStorageModel>(
            "DELETE FROM notifications WHERE id = ? RETURNING *",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, page: Page) -> Result<Vec<Notification>, Self::Error> {
        let rows = sqlx::query_as::<_, NotificationStorageModel>(
            "
SELECT * FROM notifications
ORDER BY created_at ASC, rowid ASC
LIMIT ? OFFSET ?
",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn recently_created(&self, page: Page) -> Result<Vec<Notification>, Self::Error> {
        self.fetch_page(NotificationStatus::Pending, page).await
    }

    async fn recently_sent(&self, page: Page) -> Result<Vec<Notification>, Self::Error> {
        self.fetch_page(NotificationStatus::Sent, page).await
    }

    /// Times are stored as whole milliseconds, so a `send_at` less than a
    /// millisecond after `now` already counts as due.
    ///
    /// Due rows that cannot be decoded are marked failed and left out.
    async fn fetch_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, Self::Error> {
        let rows = sqlx::query_as::<_, NotificationStorageModel>(
            "
SELECT * FROM notifications
WHERE status = ? AND send_at <= ?
ORDER BY created_at ASC, rowid ASC
",
        )
        .bind(NotificationStatus::Pending.as_str())
        .bind(to_millis(now))
        .fetch_all(&self.pool)
        .await?;

        let mut due = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match Notification::try_from(row) {
                Ok(notification) => due.push(notification),
                Err(error) => {
                    log::error!("Could not decode due notification {id}, marking it failed: {error}");
                    self.mark_undecodable_failed(&id).await?;
                }
            }
        }

        Ok(due)
    }

    async fn update_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> Result<(), Self::Error> {
        let result = sqlx::query(
            "
UPDATE notifications
SET status = ?,
    updated_at = ?
WHERE id = ?
",
        )
        .bind(status.as_str())
        .bind(to_millis(Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SqliteStorageError::NotFound(id));
        }

        Ok(())
    }
}
