use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use istore_core::{CoreError, Repositories};
use istore_shared::{Masked, NewProfile, Profile};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{RequireSession, SessionClaims},
    state::{AppState, AuthConfig},
};

/// Window the per-email magic link limit applies to.
const MAGIC_LINK_WINDOW_SECONDS: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub profile: Profile,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/magic-link", post(request_magic_link))
        .route("/v1/auth/verify", post(verify_magic_link))
        .route("/v1/auth/session", get(current_session))
        .route("/v1/auth/logout", post(logout))
}

/// Trimmed, lowercased email; `None` when it cannot be one.
fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(email),
        _ => None,
    }
}

fn magic_link(public_url: &str, token: &str) -> String {
    format!("{}/#/auth?token={}", public_url.trim_end_matches('/'), token)
}

pub(crate) fn issue_session(auth: &AuthConfig, profile: &Profile) -> Result<String, AppError> {
    let claims = SessionClaims {
        sub: profile.id,
        email: profile.email.clone(),
        role: profile.role.as_str().to_owned(),
        jti: Uuid::new_v4().to_string(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Token encoding failed: {}", e)))
}

/// Gets or creates the profile behind a login. A concurrent first login for the
/// same email may win the insert; its profile is then read back.
async fn profile_for_login(repos: &Repositories, email: &str) -> Result<Profile, AppError> {
    if let Some(profile) = repos.profiles.find_by_email(email).await? {
        return Ok(profile);
    }

    tracing::info!(email = %Masked::from(email), "First access, creating profile");
    match repos.profiles.create_profile(NewProfile::first_access(email)).await {
        Ok(profile) => Ok(profile),
        Err(CoreError::Conflict(_)) => repos
            .profiles
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::ConflictError("profile could not be created".to_string())),
        Err(e) => Err(e.into()),
    }
}

async fn request_magic_link(
    State(state): State<AppState>,
    Json(payload): Json<MagicLinkRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let email = normalize_email(&payload.email)
        .ok_or_else(|| AppError::ValidationError("a valid email is required".to_string()))?;

    let allowed = state
        .sessions
        .check_rate_limit(
            &format!("magic-link:{}", email),
            state.auth.magic_link_rate_limit,
            MAGIC_LINK_WINDOW_SECONDS,
        )
        .await?;
    if !allowed {
        tracing::warn!(email = %Masked::from(email.as_str()), "Magic link rate limit hit");
        return Err(AppError::RateLimited("too many login requests, try again later".to_string()));
    }

    let token = state
        .sessions
        .issue_login_token(&email, state.auth.magic_link_ttl)
        .await?;
    state
        .delivery
        .deliver(&email, &magic_link(&state.auth.public_url, &token))
        .await?;
    state.metrics.magic_links.inc();

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Enviado! Revisa tu bandeja de entrada y haz clic en el botón de acceso.".to_string(),
        }),
    ))
}

async fn verify_magic_link(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = state
        .sessions
        .consume_login_token(payload.token.trim())
        .await?
        .ok_or_else(|| AppError::AuthenticationError("invalid or expired login link".to_string()))?;

    let profile = profile_for_login(&state.repos, &email).await?;

    let token = issue_session(&state.auth, &profile)?;
    state.metrics.logins.inc();

    Ok(Json(SessionResponse { token, profile }))
}

async fn current_session(
    State(state): State<AppState>,
    RequireSession(claims): RequireSession,
) -> Result<Json<Profile>, AppError> {
    state
        .repos
        .profiles
        .get_profile(claims.sub)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::AuthenticationError("session profile no longer exists".to_string()))
}

async fn logout(
    State(state): State<AppState>,
    RequireSession(claims): RequireSession,
) -> Result<StatusCode, AppError> {
    let remaining = (claims.exp as i64 - Utc::now().timestamp()).max(1) as u64;
    state.sessions.revoke_session(&claims.jti, remaining).await?;
    Ok(StatusCode::NO_CONTENT)
}
