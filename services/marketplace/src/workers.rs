//! Worker moderation for administrators

use std::sync::Arc;

use auth::models::Admin;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewNotification, Worker},
    notifications::NotificationHub,
    repositories::WorkerStore,
};

#[derive(Clone)]
pub struct WorkerDesk {
    workers: Arc<dyn WorkerStore>,
    notifications: NotificationHub,
}

impl WorkerDesk {
    pub fn new(workers: Arc<dyn WorkerStore>, notifications: NotificationHub) -> Self {
        Self {
            workers,
            notifications,
        }
    }

    /// Mark a worker profile verified and tell its owner
    ///
    /// Verifying an already verified worker changes nothing and sends no
    /// second notice.
    pub async fn verify(&self, admin: &Admin, worker_id: Uuid) -> ApiResult<Worker> {
        let current = self
            .workers
            .find(worker_id)
            .await?
            .ok_or_else(worker_not_found)?;
        if current.is_verified {
            return Ok(current);
        }

        let worker = self
            .workers
            .mark_verified(worker_id)
            .await?
            .ok_or_else(worker_not_found)?;

        info!("Worker {} verified by admin {}", worker.id, admin.id);

        let notification = NewNotification::worker_verified(&worker, admin);
        if let Err(e) = self.notifications.emit(notification).await {
            error!("Failed to record verification notice for {}: {:#}", worker.user_id, e);
        }

        Ok(worker)
    }
}

fn worker_not_found() -> ApiError {
    ApiError::NotFound("Worker not found".to_string())
}
