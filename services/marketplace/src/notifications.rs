//! Notification fan-out
//!
//! A notification is persisted first and pushed second. The push is a
//! freshness optimization: when it fails the record is still there for the
//! recipient's next listing.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{NewNotification, Notification},
    realtime::{Publisher, RealtimeEvent},
    repositories::NotificationStore,
};

/// Persists notifications and pushes them to live connections
#[derive(Clone)]
pub struct NotificationHub {
    store: Arc<dyn NotificationStore>,
    publisher: Arc<dyn Publisher>,
}

impl NotificationHub {
    pub fn new(store: Arc<dyn NotificationStore>, publisher: Arc<dyn Publisher>) -> Self {
        Self { store, publisher }
    }

    /// Record a notification on its recipient's list and try to push it
    ///
    /// Only a persistence failure is an error.
    pub async fn emit(&self, new_notification: NewNotification) -> Result<Notification> {
        let notification = self.store.create(new_notification).await?;
        info!(
            "Notification {} ({}) for {}",
            notification.id,
            notification.kind.as_str(),
            notification.recipient_id
        );

        let event = RealtimeEvent::new_notification(notification.clone());
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "Realtime push of notification {} failed: {}",
                notification.id, e
            );
        }

        Ok(notification)
    }

    /// Mark the caller's notifications read; foreign or unknown ids are skipped
    pub async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> Result<u64> {
        let flipped = self.store.mark_read(recipient_id, ids).await?;
        info!("Marked {} of {} notifications read for {}", flipped, ids.len(), recipient_id);
        Ok(flipped)
    }

    /// Recipient's notifications, newest first
    pub async fn list(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        self.store.list_for_recipient(recipient_id).await
    }
}
