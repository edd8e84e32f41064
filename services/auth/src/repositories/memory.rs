//! In-process principal store for tests and local runs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::PrincipalStore;
use crate::models::{Admin, User};

#[derive(Default)]
struct Principals {
    users: HashMap<Uuid, User>,
    admins: HashMap<Uuid, Admin>,
}

/// Principal store held in memory
#[derive(Clone, Default)]
pub struct MemoryPrincipalStore {
    inner: Arc<RwLock<Principals>>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user
    pub fn put_user(&self, user: User) {
        self.inner.write().users.insert(user.id, user);
    }

    /// Insert or replace an admin
    pub fn put_admin(&self, admin: Admin) {
        self.inner.write().admins.insert(admin.id, admin);
    }

    /// Apply `change` to a stored user, returning false when absent
    pub fn update_user(&self, id: Uuid, change: impl FnOnce(&mut User)) -> bool {
        match self.inner.write().users.get_mut(&id) {
            Some(user) => {
                change(user);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn find_admin(&self, id: Uuid) -> Result<Option<Admin>> {
        Ok(self.inner.read().admins.get(&id).cloned())
    }
}
