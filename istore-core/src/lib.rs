pub mod repository;
pub mod context;
pub mod session;

pub use repository::{
    LevelRuleRepository, PointsRepository, ProductRepository, ProfileRepository, Repositories,
    ReservationRepository, SettingsRepository,
};
pub use context::StorefrontContext;
pub use session::{LinkDelivery, LogDelivery, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Session store error: {0}")]
    SessionError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
