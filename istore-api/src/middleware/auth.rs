use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Profile id.
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Session id, the handle used for revocation.
    pub jti: String,
    pub exp: usize,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

// ============================================================================
// Session Middleware
// ============================================================================

/// Attaches [`SessionClaims`] when a valid, unrevoked bearer token is present.
/// Anything else continues as an anonymous visitor.
pub async fn optional_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = match bearer_token(&req) {
        Some(token) => decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| tracing::debug!("Ignoring invalid session token: {}", e))
        .ok(),
        None => None,
    };

    if let Some(claims) = claims {
        if state.sessions.is_revoked(&claims.jti).await? {
            tracing::debug!(session_id = %claims.jti, "Ignoring revoked session");
        } else {
            req.extensions_mut().insert(claims);
        }
    }

    Ok(next.run(req).await)
}

/// Admin gate. The role is read from the store so a demoted admin loses
/// access before their token expires.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .extensions()
        .get::<SessionClaims>()
        .map(|c| c.sub)
        .ok_or_else(|| AppError::AuthenticationError("login required".to_string()))?;

    let profile = state.repos.profiles.get_profile(user_id).await?;
    match profile {
        Some(p) if p.is_admin() => Ok(next.run(req).await),
        _ => {
            tracing::warn!(user_id = %user_id, "Admin route refused");
            Err(AppError::AuthorizationError("admin access required".to_string()))
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Session of the caller, if any.
pub struct MaybeSession(pub Option<SessionClaims>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionClaims>().cloned()))
    }
}

impl MaybeSession {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|c| c.sub)
    }
}

/// Session of the caller; 401 for anonymous requests.
pub struct RequireSession(pub SessionClaims);

impl<S: Send + Sync> FromRequestParts<S> for RequireSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaims>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::AuthenticationError("login required".to_string()))
    }
}
