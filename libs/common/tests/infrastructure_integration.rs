//! Integration tests for the infrastructure components
//!
//! These tests need a running PostgreSQL and Redis; run them with
//! `--ignored` against the docker-compose stack.

use std::time::Duration;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use futures_util::StreamExt;
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_database_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_redis_publish_reaches_subscriber() -> Result<(), Box<dyn std::error::Error>> {
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    assert!(redis_pool.health_check().await?, "Redis health check failed");

    let channel = "integration_test_channel";
    let mut messages = redis_pool.subscribe(channel).await?;

    let receivers = redis_pool.publish(channel, "hello").await?;
    assert_eq!(receivers, 1);

    let received = tokio::time::timeout(Duration::from_secs(5), messages.next()).await?;
    assert_eq!(received.as_deref(), Some("hello"));

    Ok(())
}
