use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod jwt;
mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod settings;
mod state;
mod validation;

use common::{
    attendance::AttendanceEngine,
    cache::{RedisConfig, RedisPool},
    clock::SystemClock,
    database::{DatabaseConfig, init_pool, run_migrations},
    store::PgAttendanceStore,
};
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{ContactRepository, UserRepository},
    settings::ApiConfig,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting API service");

    let config = ApiConfig::from_env().context("invalid API_* settings")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(&JwtConfig::from_env()?);
    let redis_pool = RedisPool::new(&RedisConfig::from_env())?;
    let email_sender = mailer::sender_from_env()?;

    let engine = AttendanceEngine::new(
        Arc::new(PgAttendanceStore::new(pool.clone())),
        Arc::new(SystemClock),
    );

    let app_state = AppState {
        db_pool: pool.clone(),
        redis_pool,
        jwt_service,
        engine,
        user_repository: UserRepository::new(pool.clone()),
        contact_repository: ContactRepository::new(pool),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        email_sender,
        config: config.clone(),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(config.bind_address.as_str()).await?;
    info!("API service listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down API service");
        })
        .await?;

    Ok(())
}
