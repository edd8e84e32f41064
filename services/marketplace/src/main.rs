use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use auth::{IdentityGate, JwtConfig, JwtService, repositories::PgPrincipalRepository};
use common::{
    cache::{RedisConfig, RedisPool},
    database,
    settings::ServiceSettings,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use marketplace::{
    AppState, BidLedger, NotificationHub, WorkerDesk,
    realtime::{self, LocalHub, RedisPublisher},
    repositories::{
        PgBidRepository, PgNotificationRepository, PgRequestRepository, PgWorkerRepository,
    },
    routes,
};

/// Buffered events per live connection before it starts skipping
const LIVE_FEED_CAPACITY: usize = 256;
const RELAY_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting marketplace service");

    let settings = ServiceSettings::load("MARKETPLACE", "0.0.0.0:3001")?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    database::health_check(&pool).await?;
    info!("Database connection successful");

    let redis_config = RedisConfig::from_env()?;
    let redis = RedisPool::new(&redis_config).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;
    let gate = IdentityGate::new(
        jwt_service,
        Arc::new(PgPrincipalRepository::new(pool.clone())),
    );

    // Events go out through Redis and come back in through the relay, so
    // whichever instance holds the connection delivers them
    let hub = LocalHub::new(LIVE_FEED_CAPACITY);
    let publisher = RedisPublisher::new(redis.clone(), redis_config.notification_channel.clone());
    tokio::spawn(run_relay(
        redis,
        redis_config.notification_channel,
        hub.clone(),
    ));

    let notifications = NotificationHub::new(
        Arc::new(PgNotificationRepository::new(pool.clone())),
        Arc::new(publisher),
    );
    let ledger = BidLedger::new(
        Arc::new(PgBidRepository::new(pool.clone())),
        Arc::new(PgRequestRepository::new(pool.clone())),
        notifications.clone(),
    );
    let workers = WorkerDesk::new(
        Arc::new(PgWorkerRepository::new(pool)),
        notifications.clone(),
    );

    let app = routes::create_router(AppState {
        gate,
        ledger,
        notifications,
        workers,
        hub,
    });

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Marketplace service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_relay(redis: RedisPool, channel: String, hub: LocalHub) {
    loop {
        match realtime::relay(&redis, &channel, &hub).await {
            Ok(()) => warn!("Realtime subscription on {} ended", channel),
            Err(e) => warn!("Realtime relay on {} failed: {}", channel, e),
        }
        tokio::time::sleep(RELAY_RECONNECT_DELAY).await;
    }
}
