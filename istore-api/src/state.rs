use std::sync::Arc;

use istore_core::{LinkDelivery, Repositories, SessionStore};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub magic_link_ttl: u64,
    pub magic_link_rate_limit: i64,
    /// Storefront base URL magic links point at.
    pub public_url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub sessions: Arc<dyn SessionStore>,
    pub delivery: Arc<dyn LinkDelivery>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}
