//! Worker profiles moderated by administrators

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Worker entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    /// User account the profile belongs to
    pub user_id: Uuid,
    pub image_url: Option<String>,
    pub is_verified: bool,
}
