//! PostgreSQL worker repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::WorkerStore;
use crate::models::Worker;

/// Worker repository for database operations
#[derive(Clone)]
pub struct PgWorkerRepository {
    pool: PgPool,
}

impl PgWorkerRepository {
    /// Create a new worker repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkerStore for PgWorkerRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Worker>> {
        let row = sqlx::query(
            "SELECT id, user_id, image_url, is_verified FROM workers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Worker {
            id: row.get("id"),
            user_id: row.get("user_id"),
            image_url: row.get("image_url"),
            is_verified: row.get("is_verified"),
        }))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Option<Worker>> {
        let row = sqlx::query(
            r#"
            UPDATE workers
            SET is_verified = TRUE
            WHERE id = $1
            RETURNING id, user_id, image_url, is_verified
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Worker {
            id: row.get("id"),
            user_id: row.get("user_id"),
            image_url: row.get("image_url"),
            is_verified: row.get("is_verified"),
        }))
    }
}
