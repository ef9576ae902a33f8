use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use istore_shared::{
    LevelRule, Product, ProductDraft, Profile, ReservationSummary, Settings, BLUE_RATE_KEY,
    WHATSAPP_NUMBER_KEY,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{require_admin, RequireSession},
    state::AppState,
};

/// Largest single points adjustment an admin may record.
const MAX_POINTS_DELTA: u32 = 1_000_000;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SaveProductRequest {
    #[serde(flatten)]
    pub draft: ProductDraft,
    /// Replaces every image of the product when non-empty.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointsRequest {
    pub delta: i32,
    #[serde(default)]
    pub reason: String,
}

/// Admin forms post numbers either as JSON numbers or as the raw text field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    fn parse(&self) -> Option<f64> {
        match self {
            NumberInput::Number(n) => Some(*n),
            NumberInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    pub blue_rate: Option<NumberInput>,
    pub whatsapp_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LevelRuleUpdate {
    pub min_points: i32,
    pub discount_percent: f64,
    #[serde(default)]
    pub benefits_text: String,
}

#[derive(Debug, Serialize)]
pub struct SavedProduct {
    pub product: Product,
    pub images: Vec<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/products", get(list_products).post(save_product))
        .route("/v1/admin/products/template", get(product_template))
        .route("/v1/admin/users", get(list_users))
        .route("/v1/admin/users/{id}/points", post(add_points))
        .route("/v1/admin/settings", get(get_settings).put(update_settings))
        .route("/v1/admin/levels/{level}", put(upsert_level))
        .route("/v1/admin/reservations", get(list_reservations))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

// ============================================================================
// Products
// ============================================================================

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.repos.products.list_products().await?))
}

async fn product_template() -> Json<ProductDraft> {
    Json(ProductDraft::default())
}

async fn save_product(
    State(state): State<AppState>,
    Json(payload): Json<SaveProductRequest>,
) -> Result<Json<SavedProduct>, AppError> {
    let draft = payload.draft;
    if draft.model.trim().is_empty() {
        return Err(AppError::ValidationError("model is required".to_string()));
    }
    if !draft.base_price_usd.is_finite() || draft.base_price_usd < 0.0 {
        return Err(AppError::ValidationError("base_price_usd must be a non-negative number".to_string()));
    }

    let images: Vec<String> = payload
        .images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();

    let product = state.repos.products.save_product(draft, images).await?;
    let images = state
        .repos
        .products
        .get_product_images(product.id)
        .await?
        .into_iter()
        .map(|i| i.image_url)
        .collect();

    Ok(Json(SavedProduct { product, images }))
}

// ============================================================================
// Users & Points
// ============================================================================

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Profile>>, AppError> {
    Ok(Json(state.repos.profiles.list_profiles().await?))
}

async fn add_points(
    State(state): State<AppState>,
    RequireSession(admin): RequireSession,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PointsRequest>,
) -> Result<Json<Profile>, AppError> {
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationError("reason is required".to_string()));
    }

    if payload.delta.unsigned_abs() > MAX_POINTS_DELTA {
        return Err(AppError::ValidationError(format!(
            "delta must be between -{max} and {max}",
            max = MAX_POINTS_DELTA
        )));
    }

    let profile = state
        .repos
        .points
        .add_points(user_id, payload.delta, reason, admin.sub)
        .await?;
    Ok(Json(profile))
}

// ============================================================================
// Settings & Levels
// ============================================================================

async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.repos.settings.get_settings().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsUpdate>,
) -> Result<Json<Settings>, AppError> {
    // Validate everything before the first write.
    let blue_rate = match &payload.blue_rate {
        Some(input) => match input.parse() {
            Some(rate) if rate.is_finite() && rate > 0.0 => Some(rate),
            _ => {
                return Err(AppError::ValidationError(
                    "blue_rate must be a positive number".to_string(),
                ))
            }
        },
        None => None,
    };

    if let Some(rate) = blue_rate {
        state
            .repos
            .settings
            .update_setting(BLUE_RATE_KEY, &rate.to_string())
            .await?;
    }
    if let Some(number) = &payload.whatsapp_number {
        state
            .repos
            .settings
            .update_setting(WHATSAPP_NUMBER_KEY, number.trim())
            .await?;
    }

    Ok(Json(state.repos.settings.get_settings().await?))
}

async fn upsert_level(
    State(state): State<AppState>,
    Path(level): Path<i32>,
    Json(payload): Json<LevelRuleUpdate>,
) -> Result<Json<LevelRule>, AppError> {
    if !(0.0..=100.0).contains(&payload.discount_percent) {
        return Err(AppError::ValidationError(
            "discount_percent must be between 0 and 100".to_string(),
        ));
    }
    if payload.min_points < 0 {
        return Err(AppError::ValidationError("min_points must not be negative".to_string()));
    }

    let rule = LevelRule {
        level,
        min_points: payload.min_points,
        discount_percent: payload.discount_percent,
        benefits_text: payload.benefits_text,
    };
    state.repos.levels.upsert_rule(rule.clone()).await?;
    Ok(Json(rule))
}

// ============================================================================
// Reservations
// ============================================================================

async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReservationSummary>>, AppError> {
    Ok(Json(state.repos.reservations.list_reservations().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_input_accepts_text_and_numbers() {
        let n: NumberInput = serde_json::from_str("1250.5").unwrap();
        assert_eq!(n.parse(), Some(1250.5));
        let t: NumberInput = serde_json::from_str("\" 1300 \"").unwrap();
        assert_eq!(t.parse(), Some(1300.0));
        let bad: NumberInput = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(bad.parse(), None);
    }
}
