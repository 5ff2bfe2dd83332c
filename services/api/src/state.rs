//! Application state shared across handlers

use std::sync::Arc;

use common::{attendance::AttendanceEngine, cache::RedisPool};
use mailer::EmailSender;
use sqlx::PgPool;

use crate::{
    jwt::JwtService,
    rate_limiter::RateLimiter,
    repositories::{ContactRepository, UserRepository},
    settings::ApiConfig,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub engine: AttendanceEngine,
    pub user_repository: UserRepository,
    pub contact_repository: ContactRepository,
    pub rate_limiter: RateLimiter,
    pub email_sender: Arc<dyn EmailSender>,
    pub config: ApiConfig,
}
