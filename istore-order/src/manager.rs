use istore_catalog::PriceQuote;
use istore_core::{CoreError, Repositories, StorefrontContext};
use istore_shared::{Masked, Reservation};
use serde::Serialize;
use uuid::Uuid;

use crate::handoff::{reservation_message, whatsapp_link};

/// Outcome of a reservation: the stored record plus the chat hand-off.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationReceipt {
    pub reservation: Reservation,
    pub quote: PriceQuote,
    pub message: String,
    pub handoff_url: String,
}

/// Places holds on products on behalf of storefront viewers.
pub struct ReservationManager {
    repos: Repositories,
}

impl ReservationManager {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Reserves `product_id` for the context's viewer (or an anonymous visitor)
    /// and builds the WhatsApp hand-off with the price that viewer is quoted.
    pub async fn reserve(
        &self,
        ctx: &StorefrontContext,
        product_id: Uuid,
    ) -> Result<ReservationReceipt, ReservationError> {
        let product = self
            .repos
            .products
            .get_product(product_id)
            .await?
            .ok_or(ReservationError::ProductNotFound(product_id))?;

        if !product.is_available() {
            return Err(ReservationError::AlreadyReserved(product_id));
        }

        let user_id = ctx.viewer.as_ref().map(|p| p.id);
        let reservation = self
            .repos
            .reservations
            .create_reservation(product_id, user_id)
            .await
            .map_err(|e| match e {
                CoreError::NotFound(_) => ReservationError::ProductNotFound(product_id),
                CoreError::Conflict(_) => ReservationError::AlreadyReserved(product_id),
                other => ReservationError::Core(other),
            })?;

        let quote = ctx.message_quote(&product);
        let email = ctx.viewer.as_ref().map(|p| p.email.as_str());
        let message = reservation_message(&product, &quote, email);
        let handoff_url = whatsapp_link(&ctx.whatsapp_number, &message)?.to_string();

        let requester = email
            .map(|e| Masked::from(e).to_string())
            .unwrap_or_else(|| "visitor".to_string());
        tracing::info!(
            reservation_id = %reservation.id,
            product_id = %product_id,
            %requester,
            "Reservation created"
        );

        Ok(ReservationReceipt { reservation, quote, message, handoff_url })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product already reserved: {0}")]
    AlreadyReserved(Uuid),

    #[error("Invalid hand-off link: {0}")]
    InvalidLink(#[from] url::ParseError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use istore_shared::{
        LevelRule, NewProfile, ProductDraft, ProductStatus, RESERVATION_PENDING,
    };
    use istore_store::memory_repo::MemoryStore;

    async fn seeded() -> (Repositories, Uuid) {
        let store = MemoryStore::new();
        let repos = store.repositories();

        repos.settings.update_setting("blue_rate", "1200").await.unwrap();
        repos.settings.update_setting("whatsapp_number", "5491100000000").await.unwrap();
        repos
            .levels
            .upsert_rule(LevelRule { level: 2, min_points: 500, discount_percent: 10.0, benefits_text: String::new() })
            .await
            .unwrap();

        let draft = ProductDraft { base_price_usd: 100.0, model: "iPhone 13".to_string(), ..ProductDraft::default() };
        let product = repos.products.save_product(draft, vec![]).await.unwrap();
        (repos, product.id)
    }

    #[tokio::test]
    async fn test_visitor_reservation() {
        let (repos, product_id) = seeded().await;
        let ctx = repos.load_context(None, None).await.unwrap();
        let manager = ReservationManager::new(repos.clone());

        let receipt = manager.reserve(&ctx, product_id).await.unwrap();
        assert_eq!(receipt.reservation.status, RESERVATION_PENDING);
        assert!(receipt.reservation.user_id.is_none());
        assert_eq!(receipt.quote.usd, 100.0);
        assert!(receipt.message.ends_with("Mi email: Visitante"));
        assert!(receipt.handoff_url.starts_with("https://wa.me/5491100000000?text="));

        let product = repos.products.get_product(product_id).await.unwrap().unwrap();
        assert_eq!(product.status, ProductStatus::Reserved);
    }

    #[tokio::test]
    async fn test_customer_reservation_uses_level_price() {
        let (repos, product_id) = seeded().await;
        let new = NewProfile::first_access("vip@example.com");
        let profile = repos.profiles.create_profile(new).await.unwrap();
        let profile = repos.points.add_points(profile.id, 600, "compra", Uuid::new_v4()).await.unwrap();
        assert_eq!(profile.level, 2);

        let ctx = repos.load_context(Some(profile.id), None).await.unwrap();
        let receipt = ReservationManager::new(repos.clone()).reserve(&ctx, product_id).await.unwrap();

        assert_eq!(receipt.reservation.user_id, Some(profile.id));
        assert_eq!(receipt.quote.usd, 90.0);
        assert!(receipt.message.contains("$90 / $\u{a0}108.000"));
        assert!(receipt.message.ends_with("vip@example.com"));
    }

    #[tokio::test]
    async fn test_second_reservation_is_rejected() {
        let (repos, product_id) = seeded().await;
        let ctx = repos.load_context(None, None).await.unwrap();
        let manager = ReservationManager::new(repos);

        manager.reserve(&ctx, product_id).await.unwrap();
        let second = manager.reserve(&ctx, product_id).await;
        assert!(matches!(second, Err(ReservationError::AlreadyReserved(_))));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (repos, _) = seeded().await;
        let ctx = repos.load_context(None, None).await.unwrap();
        let result = ReservationManager::new(repos).reserve(&ctx, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ReservationError::ProductNotFound(_))));
    }
}
