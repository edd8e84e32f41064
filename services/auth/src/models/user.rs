//! End-user principal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jwt::TokenPayload;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
    pub is_verified: bool,
    pub is_blocked: bool,
    /// A password reset is pending for this account
    pub forgot_password: bool,
    pub is_worker: bool,
    /// Role markers, e.g. `BASIC`, `WORKER`
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Claims embedded in this user's tokens
    pub fn token_payload(&self) -> TokenPayload {
        let mut payload = TokenPayload::new(self.id);
        payload.name = Some(self.name.clone());
        payload.email = Some(self.email.clone());
        payload.is_verified = Some(self.is_verified);
        payload.is_blocked = Some(self.is_blocked);
        payload.forgot_password = Some(self.forgot_password);
        payload.is_worker = Some(self.is_worker);
        payload.roles = self.roles.clone();
        payload
    }
}
