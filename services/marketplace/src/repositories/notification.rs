//! PostgreSQL notification repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::NotificationStore;
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, title, description, avatar, kind, url, user_request_id, is_read, created_at";

/// Notification repository for database operations
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    let kind: String = row.try_get("kind")?;

    Ok(Notification {
        id: row.try_get("id")?,
        recipient_id: row.try_get("recipient_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        avatar: row.try_get("avatar")?,
        kind: kind.parse()?,
        url: row.try_get("url")?,
        user_request_id: row.try_get("user_request_id")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NotificationStore for PgNotificationRepository {
    async fn create(&self, new: NewNotification) -> Result<Notification> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications
                (id, recipient_id, title, description, avatar, kind, url, user_request_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.recipient_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.avatar)
        .bind(new.kind.as_str())
        .bind(&new.url)
        .bind(new.user_request_id)
        .fetch_one(&self.pool)
        .await?;

        notification_from_row(&row)
    }

    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE recipient_id = $1 AND id = ANY($2) AND is_read = FALSE
            "#,
        )
        .bind(recipient_id)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
