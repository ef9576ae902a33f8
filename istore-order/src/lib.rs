pub mod handoff;
pub mod manager;

pub use handoff::{reservation_message, whatsapp_link};
pub use manager::{ReservationError, ReservationManager, ReservationReceipt};
