//! Redis connectivity for cross-instance publish/subscribe
//!
//! Notifications are pushed through a Redis channel so that whichever
//! instance holds a client's live connection can deliver them.

use std::pin::Pin;

use anyhow::Result;
use futures_util::{Stream, StreamExt};
use redis::{AsyncCommands, Client};
use tracing::{debug, info, warn};

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Channel carrying real-time notification events
    pub notification_channel: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_NOTIFICATION_CHANNEL`: pub/sub channel name (default: "new_notification")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let notification_channel = std::env::var("REDIS_NOTIFICATION_CHANNEL")
            .unwrap_or_else(|_| "new_notification".to_string());

        Ok(RedisConfig {
            url,
            notification_channel,
        })
    }
}

/// Stream of raw message payloads received on a channel
pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Redis client handle
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Open a Redis client; connections are established lazily
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Publish a payload on a channel, returning the number of receivers
    pub async fn publish(&self, channel: &str, payload: &str) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        let receivers: u64 = conn.publish(channel, payload).await?;
        debug!("Published to {} ({} receivers)", channel, receivers);
        Ok(receivers)
    }

    /// Subscribe to a channel and stream its payloads
    ///
    /// Messages whose payload is not valid UTF-8 are dropped.
    pub async fn subscribe(&self, channel: &str) -> Result<MessageStream> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        info!("Subscribed to Redis channel {}", channel);

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            match msg.get_payload::<String>() {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!("Dropping undecodable pub/sub payload: {}", e);
                    None
                }
            }
        });

        Ok(Box::pin(stream))
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
