//! Job postings that bids attach to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    pub id: Uuid,
    /// Owner of the posting
    pub user_id: Uuid,
    pub info: String,
    pub budget: Option<String>,
    pub proposed_time_length: Option<String>,
    /// Once set, the bid collection accepts no further lifecycle transitions
    pub is_stopped: bool,
    /// Bid identifiers in submission order
    pub bids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}
