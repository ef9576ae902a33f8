use axum::{extract::State, routing::get, Json, Router};
use istore_catalog::LevelProgress;
use istore_shared::{LevelRule, PointsTransaction, Profile};
use serde::Serialize;

use crate::{error::AppError, middleware::auth::RequireSession, state::AppState};

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub profile: Profile,
    #[serde(flatten)]
    pub progress: LevelProgress,
    /// Newest first.
    pub transactions: Vec<PointsTransaction>,
}

#[derive(Debug, Serialize)]
pub struct PublicSettings {
    pub whatsapp_number: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/account", get(account))
        .route("/v1/levels", get(levels))
        .route("/v1/settings/public", get(public_settings))
}

async fn account(
    State(state): State<AppState>,
    RequireSession(claims): RequireSession,
) -> Result<Json<AccountView>, AppError> {
    let ctx = state.repos.load_context(Some(claims.sub), None).await?;
    let profile = ctx
        .viewer
        .ok_or_else(|| AppError::NotFoundError("profile not found".to_string()))?;

    let progress = ctx.levels.progress(&profile);
    let transactions = state.repos.points.list_transactions(profile.id).await?;

    Ok(Json(AccountView { profile, progress, transactions }))
}

async fn levels(State(state): State<AppState>) -> Result<Json<Vec<LevelRule>>, AppError> {
    Ok(Json(state.repos.levels.list_rules().await?))
}

async fn public_settings(State(state): State<AppState>) -> Result<Json<PublicSettings>, AppError> {
    let settings = state.repos.settings.get_settings().await?;
    Ok(Json(PublicSettings { whatsapp_number: settings.whatsapp_number }))
}
