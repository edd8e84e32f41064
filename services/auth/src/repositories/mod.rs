//! Principal lookup

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Admin, User};

pub mod memory;
pub mod principal;

pub use memory::MemoryPrincipalStore;
pub use principal::PgPrincipalRepository;

/// Read access to both principal collections
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Find a user by ID
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Find an admin by ID
    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>>;
}
