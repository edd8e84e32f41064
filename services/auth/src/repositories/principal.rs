//! PostgreSQL-backed principal repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use super::PrincipalStore;
use crate::models::{Admin, User};

/// Principal repository
#[derive(Clone)]
pub struct PgPrincipalRepository {
    pool: PgPool,
}

impl PgPrincipalRepository {
    /// Create a new principal repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        image_url: row.get("image_url"),
        is_verified: row.get("is_verified"),
        is_blocked: row.get("is_blocked"),
        forgot_password: row.get("forgot_password"),
        is_worker: row.get("is_worker"),
        roles: row.get("roles"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        debug!("Finding user by ID: {}", id);

        let row = sqlx::query(
            r#"
            SELECT id, name, email, image_url, is_verified, is_blocked,
                   forgot_password, is_worker, roles, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>> {
        debug!("Finding admin by ID: {}", id);

        let row = sqlx::query(
            r#"
            SELECT id, name, email, role, is_blocked, created_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Admin {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            role: row.get("role"),
            is_blocked: row.get("is_blocked"),
            created_at: row.get("created_at"),
        }))
    }
}
