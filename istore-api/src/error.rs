use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use istore_core::CoreError;
use istore_order::ReservationError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),
    #[error("Forbidden: {0}")]
    AuthorizationError(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => Self::ValidationError(msg),
            CoreError::NotFound(msg) => Self::NotFoundError(msg),
            CoreError::Conflict(msg) => Self::ConflictError(msg),
            other => Self::Anyhow(other.into()),
        }
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::ProductNotFound(_) => Self::NotFoundError("product not found".to_string()),
            ReservationError::AlreadyReserved(_) => {
                Self::ConflictError("product already reserved".to_string())
            }
            ReservationError::Core(core) => core.into(),
            other => Self::Anyhow(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(CoreError::ValidationError("x".into())), StatusCode::BAD_REQUEST),
            (AppError::from(CoreError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (AppError::from(CoreError::Conflict("x".into())), StatusCode::CONFLICT),
            (AppError::from(CoreError::StorageError("x".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::from(ReservationError::AlreadyReserved(Uuid::nil())), StatusCode::CONFLICT),
            (AppError::from(ReservationError::ProductNotFound(Uuid::nil())), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
