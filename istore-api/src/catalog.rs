use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use istore_catalog::{PriceQuote, ProductFilter};
use istore_core::StorefrontContext;
use istore_order::{ReservationError, ReservationManager, ReservationReceipt};
use istore_shared::{Product, ProductCondition, ProductImage, ProductStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::MaybeSession, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub model: Option<String>,
    pub condition: Option<String>,
    /// `available` when absent, `all` disables the filter.
    pub status: Option<String>,
    pub view_as_level: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub view_as_level: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: Product,
    /// `null` when the viewer may not see prices.
    pub price: Option<PriceQuote>,
    pub sealed: bool,
    pub reserved: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub price: Option<PriceQuote>,
    pub reservable: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", get(list_products))
        .route("/v1/products/{id}", get(get_product))
        .route("/v1/products/{id}/reservations", post(reserve_product))
}

impl CatalogQuery {
    fn filter(&self) -> Result<ProductFilter, AppError> {
        let condition = match self.condition.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(
                raw.parse::<ProductCondition>()
                    .map_err(|e| AppError::ValidationError(e.to_string()))?,
            ),
        };
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => Some(ProductStatus::Available),
            Some("all") => None,
            Some(raw) => Some(
                raw.parse::<ProductStatus>()
                    .map_err(|e| AppError::ValidationError(e.to_string()))?,
            ),
        };

        Ok(ProductFilter {
            model: self.model.clone().unwrap_or_default(),
            condition,
            status,
        })
    }
}

fn card(ctx: &StorefrontContext, product: Product) -> ProductCard {
    ProductCard {
        price: ctx.quote(&product),
        sealed: product.condition == ProductCondition::Sealed,
        reserved: product.status == ProductStatus::Reserved,
        product,
    }
}

async fn list_products(
    State(state): State<AppState>,
    session: MaybeSession,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<ProductCard>>, AppError> {
    let filter = query.filter()?;
    let ctx = state
        .repos
        .load_context(session.user_id(), query.view_as_level)
        .await?;

    let products = filter.apply(state.repos.products.list_products().await?);
    tracing::debug!(count = products.len(), prices_visible = ctx.price_visibility().is_visible(), "Catalog listed");

    Ok(Json(products.into_iter().map(|p| card(&ctx, p)).collect()))
}

async fn get_product(
    State(state): State<AppState>,
    session: MaybeSession,
    Path(id): Path<Uuid>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ProductDetail>, AppError> {
    let Some(product) = state.repos.products.get_product(id).await? else {
        tracing::debug!(product_id = %id, "Product not found");
        return Err(AppError::NotFoundError("product not found".to_string()));
    };

    let ctx = state
        .repos
        .load_context(session.user_id(), query.view_as_level)
        .await?;
    let images = state.repos.products.get_product_images(id).await?;

    Ok(Json(ProductDetail {
        price: ctx.quote(&product),
        reservable: product.is_available(),
        images,
        product,
    }))
}

async fn reserve_product(
    State(state): State<AppState>,
    session: MaybeSession,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReservationReceipt>), AppError> {
    let ctx = state.repos.load_context(session.user_id(), None).await?;

    let outcome = ReservationManager::new(state.repos.clone()).reserve(&ctx, id).await;
    let label = match &outcome {
        Ok(_) => "created",
        Err(ReservationError::AlreadyReserved(_)) => "conflict",
        Err(ReservationError::ProductNotFound(_)) => "not_found",
        Err(_) => "error",
    };
    state.metrics.reservations.with_label_values(&[label]).inc();

    Ok((StatusCode::CREATED, Json(outcome?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_available() {
        let filter = CatalogQuery::default().filter().unwrap();
        assert_eq!(filter.status, Some(ProductStatus::Available));

        let all = CatalogQuery { status: Some("all".into()), ..Default::default() };
        assert_eq!(all.filter().unwrap().status, None);
    }

    #[test]
    fn test_bad_condition_is_rejected() {
        let query = CatalogQuery { condition: Some("broken".into()), ..Default::default() };
        assert!(matches!(query.filter(), Err(AppError::ValidationError(_))));
    }
}
