use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use istore_shared::{
    LevelRule, NewProfile, PointsTransaction, Product, ProductDraft, ProductImage, Profile,
    Reservation, ReservationSummary, Settings,
};

use crate::CoreResult;

/// Customer profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> CoreResult<Option<Profile>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Profile>>;

    /// Fails with `Conflict` when the id or the email (case-insensitive) is taken.
    async fn create_profile(&self, profile: NewProfile) -> CoreResult<Profile>;

    /// Newest first.
    async fn list_profiles(&self) -> CoreResult<Vec<Profile>>;
}

/// Product catalog and product images.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Newest first.
    async fn list_products(&self) -> CoreResult<Vec<Product>>;

    async fn get_product(&self, id: Uuid) -> CoreResult<Option<Product>>;

    async fn get_product_images(&self, product_id: Uuid) -> CoreResult<Vec<ProductImage>>;

    /// Inserts a draft without id, updates otherwise. A non-empty `images`
    /// list replaces every image of the product; an empty one keeps them.
    async fn save_product(&self, draft: ProductDraft, images: Vec<String>) -> CoreResult<Product>;
}

/// Global key/value settings.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(&self) -> CoreResult<Settings>;

    async fn update_setting(&self, key: &str, value: &str) -> CoreResult<()>;
}

#[async_trait]
pub trait LevelRuleRepository: Send + Sync {
    /// Ordered by ascending level.
    async fn list_rules(&self) -> CoreResult<Vec<LevelRule>>;

    async fn upsert_rule(&self, rule: LevelRule) -> CoreResult<()>;
}

/// Append-only points ledger.
#[async_trait]
pub trait PointsRepository: Send + Sync {
    /// Records the transaction, adjusts the profile's points and recomputes its
    /// level against the current rules, all in one unit of work.
    async fn add_points(
        &self,
        user_id: Uuid,
        delta: i32,
        reason: &str,
        admin_id: Uuid,
    ) -> CoreResult<Profile>;

    /// Newest first.
    async fn list_transactions(&self, user_id: Uuid) -> CoreResult<Vec<PointsTransaction>>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Inserts a pending reservation and marks the product reserved.
    /// Fails with `NotFound` for an unknown product and `Conflict` when it is
    /// already reserved.
    async fn create_reservation(
        &self,
        product_id: Uuid,
        user_id: Option<Uuid>,
    ) -> CoreResult<Reservation>;

    /// Newest first, joined with product and requester.
    async fn list_reservations(&self) -> CoreResult<Vec<ReservationSummary>>;
}

/// Every data-access handle the storefront needs, shared across requests.
#[derive(Clone)]
pub struct Repositories {
    pub profiles: Arc<dyn ProfileRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub levels: Arc<dyn LevelRuleRepository>,
    pub points: Arc<dyn PointsRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
}
