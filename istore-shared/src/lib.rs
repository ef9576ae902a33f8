pub mod models;
pub mod pii;

pub use models::{
    LevelRule, NewProfile, PointsTransaction, Product, ProductCondition, ProductDraft, ProductImage,
    ProductStatus, ProductSummary, Profile, Reservation, ReservationSummary, Settings, UnknownVariant,
    UserRole, RESERVATION_PENDING,
};
pub use models::settings::{BLUE_RATE_KEY, DEFAULT_BLUE_RATE, WHATSAPP_NUMBER_KEY};
pub use pii::Masked;
