//! Administrator principal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jwt::TokenPayload;

/// Admin entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Option<i32>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Claims embedded in this admin's tokens
    pub fn token_payload(&self) -> TokenPayload {
        let mut payload = TokenPayload::new(self.id);
        payload.name = Some(self.name.clone());
        payload.email = Some(self.email.clone());
        payload
    }
}
