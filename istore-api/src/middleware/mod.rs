pub mod auth;

pub use auth::{optional_session, require_admin, MaybeSession, RequireSession, SessionClaims};
