use std::sync::Arc;

use db::DBService;
use sqlx::SqlitePool;

use crate::{auth::SessionVerifier, config::PlannerConfig, middleware::rate_limit::RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Arc<PlannerConfig>,
    pub sessions: Arc<SessionVerifier>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db: DBService, config: PlannerConfig) -> Self {
        let sessions = SessionVerifier::new(config.jwt_secret.clone());
        let rate_limiter = RateLimiter::new(config.rate_limit);
        Self {
            db,
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
