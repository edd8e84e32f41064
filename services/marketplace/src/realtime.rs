//! Real-time push channel
//!
//! Every event is broadcast to every live connection and tagged with its
//! recipient; consumers filter by recipient. Delivery is best-effort, the
//! persisted notification stays the source of truth.

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use futures_util::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Notification;

/// Event name clients listen for
pub const NEW_NOTIFICATION: &str = "new_notification";

/// Wire event pushed to live connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: String,
    pub recipient_id: Uuid,
    pub notification: Notification,
}

impl RealtimeEvent {
    pub fn new_notification(notification: Notification) -> Self {
        Self {
            event: NEW_NOTIFICATION.to_string(),
            recipient_id: notification.recipient_id,
            notification,
        }
    }
}

/// Stream of events for one recipient
pub type EventStream = Pin<Box<dyn Stream<Item = RealtimeEvent> + Send>>;

/// Outbound side of the push channel
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, event: &RealtimeEvent) -> Result<()>;
}

/// In-process fan-out to the connections this instance holds
#[derive(Clone)]
pub struct LocalHub {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl LocalHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Hand an event to every current subscriber, returning how many got it
    pub fn deliver(&self, event: RealtimeEvent) -> usize {
        // No subscribers is not an error, nobody is listening
        self.tx.send(event).unwrap_or(0)
    }

    /// Live events addressed to `recipient_id`
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub fn subscribe(&self, recipient_id: Uuid) -> EventStream {
        let rx = self.tx.subscribe();

        let events = stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.recipient_id == recipient_id => return Some((event, rx)),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Live feed for {} lagged, {} events skipped", recipient_id, skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        Box::pin(events)
    }
}

#[async_trait]
impl Publisher for LocalHub {
    async fn publish(&self, event: &RealtimeEvent) -> Result<()> {
        let receivers = self.deliver(event.clone());
        debug!("Delivered {} locally to {} subscribers", event.event, receivers);
        Ok(())
    }
}

/// Publishes events on a Redis channel shared by every instance
#[derive(Clone)]
pub struct RedisPublisher {
    redis: RedisPool,
    channel: String,
}

impl RedisPublisher {
    pub fn new(redis: RedisPool, channel: impl Into<String>) -> Self {
        Self {
            redis,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl Publisher for RedisPublisher {
    async fn publish(&self, event: &RealtimeEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        self.redis.publish(&self.channel, &payload).await?;
        Ok(())
    }
}

/// Forward every event on the Redis channel into the local hub
///
/// Returns when the subscription ends; callers reconnect.
pub async fn relay(redis: &RedisPool, channel: &str, hub: &LocalHub) -> Result<()> {
    let mut messages = redis.subscribe(channel).await?;

    while let Some(payload) = messages.next().await {
        match serde_json::from_str::<RealtimeEvent>(&payload) {
            Ok(event) => {
                hub.deliver(event);
            }
            Err(e) => warn!("Ignoring malformed realtime event: {}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use chrono::Utc;

    fn notification(recipient_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            title: "New Bidding Request !".to_string(),
            description: "Made By Sam".to_string(),
            avatar: None,
            kind: NotificationKind::NewBid,
            url: "/smurf-app/user-request/1".to_string(),
            user_request_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_own_events() {
        let hub = LocalHub::new(16);
        let me = Uuid::new_v4();
        let mut feed = hub.subscribe(me);

        hub.deliver(RealtimeEvent::new_notification(notification(Uuid::new_v4())));
        hub.deliver(RealtimeEvent::new_notification(notification(me)));

        let event = feed.next().await.unwrap();
        assert_eq!(event.recipient_id, me);
        assert_eq!(event.event, NEW_NOTIFICATION);
    }

    #[tokio::test]
    async fn test_publish_without_listeners_succeeds() {
        let hub = LocalHub::new(4);
        let event = RealtimeEvent::new_notification(notification(Uuid::new_v4()));

        assert_eq!(hub.deliver(event.clone()), 0);
        assert!(hub.publish(&event).await.is_ok());
    }

    #[test]
    fn test_event_wire_format() {
        let event = RealtimeEvent::new_notification(notification(Uuid::new_v4()));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "new_notification");
        assert_eq!(value["notification"]["type"], "new_bid");
        assert_eq!(value["notification"]["is_read"], false);
    }
}
