pub mod catalog;
pub mod loyalty;
pub mod reservation;
pub mod settings;

pub use catalog::{Product, ProductCondition, ProductDraft, ProductImage, ProductStatus};
pub use loyalty::{LevelRule, NewProfile, PointsTransaction, Profile, UserRole};
pub use reservation::{ProductSummary, Reservation, ReservationSummary, RESERVATION_PENDING};
pub use settings::Settings;

/// Error returned when a stored enum value does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
