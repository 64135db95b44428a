pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod notifications;

use config::Config;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::db::Store;
use crate::notifications::{Mailer, SmtpMailer};

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub rate_limiter: Arc<RateLimiter>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        let mailer = Arc::new(SmtpMailer::new(config.email.clone()));
        Self::with_mailer(config, store, mailer)
    }

    /// Build state with a specific mailer
    pub fn with_mailer(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            store,
            rate_limiter,
            mailer,
        }
    }
}
