use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const RESERVATION_PENDING: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSummary {
    pub model: String,
    pub storage: String,
    pub color: String,
}

/// Reservation as shown in the back office, joined with what was reserved and by whom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationSummary {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub product: Option<ProductSummary>,
    pub requester_email: Option<String>,
}
