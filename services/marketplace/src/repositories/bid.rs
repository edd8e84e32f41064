//! PostgreSQL bid repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::BidStore;
use crate::models::{Bid, BidStatus, NewBid};

const BID_COLUMNS: &str =
    "id, user_id, request_id, info, proposed_budget, proposed_time, status, created_at";

/// Bid repository for database operations
#[derive(Clone)]
pub struct PgBidRepository {
    pool: PgPool,
}

impl PgBidRepository {
    /// Create a new bid repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bid_from_row(row: &PgRow) -> Result<Bid> {
    let status: String = row.try_get("status")?;

    Ok(Bid {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        request_id: row.try_get("request_id")?,
        info: row.try_get("info")?,
        proposed_budget: row.try_get("proposed_budget")?,
        proposed_time: row.try_get("proposed_time")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl BidStore for PgBidRepository {
    async fn create(&self, new_bid: NewBid) -> Result<Bid> {
        info!(
            "Creating bid by {} on request {}",
            new_bid.user_id, new_bid.request_id
        );

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bids (id, user_id, request_id, info, proposed_budget, proposed_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new_bid.user_id)
        .bind(new_bid.request_id)
        .bind(&new_bid.info)
        .bind(&new_bid.proposed_budget)
        .bind(&new_bid.proposed_time)
        .bind(BidStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        bid_from_row(&row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Bid>> {
        let row = sqlx::query(&format!("SELECT {BID_COLUMNS} FROM bids WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(bid_from_row).transpose()
    }

    async fn find_owned(&self, id: Uuid, worker_id: Uuid) -> Result<Option<Bid>> {
        let row = sqlx::query(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(bid_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bids WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_request(&self, request_id: Uuid) -> Result<Vec<Bid>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE request_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(bid_from_row).collect()
    }

    async fn reject_pending(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bids
            SET status = $2
            WHERE id = $1
              AND status = $3
              AND EXISTS (
                  SELECT 1 FROM user_requests
                  WHERE user_requests.id = bids.request_id AND NOT user_requests.is_stopped
              )
            "#,
        )
        .bind(id)
        .bind(BidStatus::Rejected.as_str())
        .bind(BidStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
