use std::sync::Arc;

use anyhow::Result;
use common::{database, settings::ServiceSettings};
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{
    IdentityGate, JwtConfig, JwtService, repositories::PgPrincipalRepository, routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let settings = ServiceSettings::load("AUTH", "0.0.0.0:3000")?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    database::health_check(&pool).await?;
    info!("Database connection successful");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    let principals = Arc::new(PgPrincipalRepository::new(pool));
    let gate = IdentityGate::new(jwt_service, principals);

    let app = routes::create_router(gate);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
