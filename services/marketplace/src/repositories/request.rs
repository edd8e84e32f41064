//! PostgreSQL user request repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};
use uuid::Uuid;

use super::{AcceptOutcome, RequestStore};
use crate::models::{BidStatus, UserRequest};

const REQUEST_COLUMNS: &str =
    "id, user_id, info, budget, proposed_time_length, is_stopped, bids, created_at";

/// User request repository for database operations
#[derive(Clone)]
pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    /// Create a new request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn request_from_row(row: &PgRow) -> Result<UserRequest> {
    Ok(UserRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        info: row.try_get("info")?,
        budget: row.try_get("budget")?,
        proposed_time_length: row.try_get("proposed_time_length")?,
        is_stopped: row.try_get("is_stopped")?,
        bids: row.try_get("bids")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl RequestStore for PgRequestRepository {
    async fn find(&self, id: Uuid) -> Result<Option<UserRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM user_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn append_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_requests
            SET bids = array_append(bids, $2)
            WHERE id = $1 AND is_stopped = FALSE
            "#,
        )
        .bind(request_id)
        .bind(bid_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE user_requests SET bids = array_remove(bids, $2) WHERE id = $1")
            .bind(request_id)
            .bind(bid_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn stop(&self, request_id: Uuid) -> Result<Option<UserRequest>> {
        let row = sqlx::query(&format!(
            "UPDATE user_requests SET is_stopped = TRUE WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn accept_bid(&self, request_id: Uuid, bid_id: Uuid) -> Result<AcceptOutcome> {
        let mut tx = self.pool.begin().await?;

        // Claiming the stopped flag locks the request row; a concurrent
        // acceptance blocks here and then finds the flag already set.
        let stopped = sqlx::query(
            r#"
            UPDATE user_requests
            SET is_stopped = TRUE
            WHERE id = $1 AND is_stopped = FALSE
            RETURNING bids
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = stopped else {
            tx.rollback().await?;
            warn!("Request {} already stopped, acceptance of {} lost", request_id, bid_id);
            return Ok(AcceptOutcome::RequestStopped);
        };
        let snapshot: Vec<Uuid> = row.try_get("bids")?;

        let accepted = sqlx::query(
            "UPDATE bids SET status = $3 WHERE id = $1 AND request_id = $2 AND status = $4",
        )
        .bind(bid_id)
        .bind(request_id)
        .bind(BidStatus::Accepted.as_str())
        .bind(BidStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        if accepted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(AcceptOutcome::BidNotPending);
        }

        let siblings: Vec<Uuid> = snapshot.into_iter().filter(|id| *id != bid_id).collect();
        let rejected: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE bids
            SET status = $4
            WHERE (id = ANY($1) OR request_id = $2) AND id <> $3 AND status = $5
            RETURNING id
            "#,
        )
        .bind(&siblings)
        .bind(request_id)
        .bind(bid_id)
        .bind(BidStatus::Rejected.as_str())
        .bind(BidStatus::Pending.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Accepted bid {} on request {}, rejected {} siblings",
            bid_id,
            request_id,
            rejected.len()
        );
        Ok(AcceptOutcome::Committed { rejected })
    }
}
