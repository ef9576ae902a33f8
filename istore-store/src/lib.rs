pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod profile_repo;
pub mod settings_repo;
pub mod points_repo;
pub mod reservation_repo;
pub mod redis_repo;
pub mod memory_repo;

use std::sync::Arc;

use istore_core::{CoreError, Repositories};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;

pub use database::DbClient;
pub use memory_repo::{MemorySessionStore, MemoryStore};
pub use redis_repo::RedisSessionStore;

const LOGIN_TOKEN_LEN: usize = 48;

/// Postgres-backed handles for every repository, sharing one pool.
pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        profiles: Arc::new(profile_repo::StoreProfileRepository::new(pool.clone())),
        products: Arc::new(catalog_repo::StoreProductRepository::new(pool.clone())),
        settings: Arc::new(settings_repo::StoreSettingsRepository::new(pool.clone())),
        levels: Arc::new(settings_repo::StoreLevelRuleRepository::new(pool.clone())),
        points: Arc::new(points_repo::StorePointsRepository::new(pool.clone())),
        reservations: Arc::new(reservation_repo::StoreReservationRepository::new(pool)),
    }
}

/// Random URL-safe token for magic links.
pub fn new_login_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LOGIN_TOKEN_LEN)
        .map(char::from)
        .collect()
}

// Postgres SQLSTATE codes callers can act on.
const UNIQUE_VIOLATION: &str = "23505";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    if let Some(db) = err.as_database_error() {
        if let Some(mapped) = classify_db_error(db.code().as_deref(), db.message()) {
            return mapped;
        }
    }
    CoreError::StorageError(err.to_string())
}

fn classify_db_error(code: Option<&str>, message: &str) -> Option<CoreError> {
    match code? {
        UNIQUE_VIOLATION => Some(CoreError::Conflict(message.to_string())),
        NUMERIC_VALUE_OUT_OF_RANGE => Some(CoreError::ValidationError(message.to_string())),
        _ => None,
    }
}

pub(crate) fn corrupt_row(err: istore_shared::UnknownVariant) -> CoreError {
    CoreError::StorageError(err.to_string())
}
