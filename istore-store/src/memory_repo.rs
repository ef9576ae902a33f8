//! In-process storage used by tests and the `memory` storage backend.
//! Mirrors the Postgres repositories' contracts without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use istore_catalog::LevelTable;
use istore_core::{
    CoreError, CoreResult, LevelRuleRepository, PointsRepository, ProductRepository,
    ProfileRepository, Repositories, ReservationRepository, SessionStore, SettingsRepository,
};
use istore_shared::{
    LevelRule, NewProfile, PointsTransaction, Product, ProductDraft, ProductImage, ProductStatus,
    ProductSummary, Profile, Reservation, ReservationSummary, Settings, RESERVATION_PENDING,
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::new_login_token;

#[derive(Default)]
struct MemoryData {
    // Insertion order; listings walk them backwards for newest first.
    products: Vec<Product>,
    images: Vec<ProductImage>,
    profiles: Vec<Profile>,
    settings: HashMap<String, String>,
    rules: BTreeMap<i32, LevelRule>,
    transactions: Vec<PointsTransaction>,
    reservations: Vec<Reservation>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(self) -> Repositories {
        let store = Arc::new(self);
        Repositories {
            profiles: store.clone(),
            products: store.clone(),
            settings: store.clone(),
            levels: store.clone(),
            points: store.clone(),
            reservations: store,
        }
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> CoreResult<Option<Profile>> {
        let data = self.data.read().await;
        Ok(data.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Profile>> {
        let data = self.data.read().await;
        Ok(data
            .profiles
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_profile(&self, profile: NewProfile) -> CoreResult<Profile> {
        let mut data = self.data.write().await;
        if data.profiles.iter().any(|p| p.id == profile.id || p.email.eq_ignore_ascii_case(&profile.email)) {
            return Err(CoreError::Conflict(format!("profile {} already exists", profile.id)));
        }
        let profile = profile.into_profile(Utc::now());
        data.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn list_profiles(&self) -> CoreResult<Vec<Profile>> {
        let data = self.data.read().await;
        Ok(data.profiles.iter().rev().cloned().collect())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list_products(&self) -> CoreResult<Vec<Product>> {
        let data = self.data.read().await;
        Ok(data.products.iter().rev().cloned().collect())
    }

    async fn get_product(&self, id: Uuid) -> CoreResult<Option<Product>> {
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_product_images(&self, product_id: Uuid) -> CoreResult<Vec<ProductImage>> {
        let data = self.data.read().await;
        Ok(data
            .images
            .iter()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn save_product(&self, draft: ProductDraft, images: Vec<String>) -> CoreResult<Product> {
        let mut data = self.data.write().await;
        let now = Utc::now();

        let product = match draft.id {
            Some(id) => {
                let slot = data
                    .products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| CoreError::NotFound(format!("product {}", id)))?;
                let updated = draft.into_product(id, slot.created_at, now);
                *slot = updated.clone();
                updated
            }
            None => {
                let product = draft.into_product(Uuid::new_v4(), now, now);
                data.products.push(product.clone());
                product
            }
        };

        if !images.is_empty() {
            data.images.retain(|i| i.product_id != product.id);
            data.images.extend(images.into_iter().map(|url| ProductImage {
                id: Uuid::new_v4(),
                product_id: product.id,
                image_url: url,
            }));
        }

        Ok(product)
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get_settings(&self) -> CoreResult<Settings> {
        let data = self.data.read().await;
        Ok(Settings::from_pairs(data.settings.iter()))
    }

    async fn update_setting(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut data = self.data.write().await;
        data.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl LevelRuleRepository for MemoryStore {
    async fn list_rules(&self) -> CoreResult<Vec<LevelRule>> {
        let data = self.data.read().await;
        Ok(data.rules.values().cloned().collect())
    }

    async fn upsert_rule(&self, rule: LevelRule) -> CoreResult<()> {
        let mut data = self.data.write().await;
        data.rules.insert(rule.level, rule);
        Ok(())
    }
}

#[async_trait]
impl PointsRepository for MemoryStore {
    async fn add_points(
        &self,
        user_id: Uuid,
        delta: i32,
        reason: &str,
        admin_id: Uuid,
    ) -> CoreResult<Profile> {
        let mut data = self.data.write().await;
        let table = LevelTable::new(data.rules.values().cloned().collect());

        let profile = data
            .profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| CoreError::NotFound(format!("profile {}", user_id)))?;
        profile.points = profile
            .points
            .checked_add(delta)
            .ok_or_else(|| CoreError::ValidationError("points balance out of range".to_string()))?;
        if let Some(level) = table.level_for_points(profile.points) {
            profile.level = level;
        }
        let profile = profile.clone();

        data.transactions.push(PointsTransaction {
            id: Uuid::new_v4(),
            user_id,
            delta_points: delta,
            reason: reason.to_string(),
            created_by: admin_id,
            created_at: Utc::now(),
        });

        Ok(profile)
    }

    async fn list_transactions(&self, user_id: Uuid) -> CoreResult<Vec<PointsTransaction>> {
        let data = self.data.read().await;
        Ok(data
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create_reservation(
        &self,
        product_id: Uuid,
        user_id: Option<Uuid>,
    ) -> CoreResult<Reservation> {
        let mut data = self.data.write().await;
        let product = data
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::NotFound(format!("product {}", product_id)))?;
        if !product.is_available() {
            return Err(CoreError::Conflict(format!("product {} is already reserved", product_id)));
        }
        product.status = ProductStatus::Reserved;
        product.updated_at = Utc::now();

        let reservation = Reservation {
            id: Uuid::new_v4(),
            product_id,
            user_id,
            status: RESERVATION_PENDING.to_string(),
            created_at: Utc::now(),
        };
        data.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn list_reservations(&self) -> CoreResult<Vec<ReservationSummary>> {
        let data = self.data.read().await;
        Ok(data
            .reservations
            .iter()
            .rev()
            .map(|r| ReservationSummary {
                reservation: r.clone(),
                product: data.products.iter().find(|p| p.id == r.product_id).map(|p| ProductSummary {
                    model: p.model.clone(),
                    storage: p.storage.clone(),
                    color: p.color.clone(),
                }),
                requester_email: r
                    .user_id
                    .and_then(|id| data.profiles.iter().find(|p| p.id == id))
                    .map(|p| p.email.clone()),
            })
            .collect())
    }
}

#[derive(Default)]
struct SessionData {
    logins: HashMap<String, (String, Instant)>,
    revoked: HashMap<String, Instant>,
    counters: HashMap<String, (i64, Instant)>,
}

/// Single-process session store with the same expiry rules as the Redis one.
#[derive(Default)]
pub struct MemorySessionStore {
    data: Mutex<SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn issue_login_token(&self, email: &str, ttl_seconds: u64) -> CoreResult<String> {
        let token = new_login_token();
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.data
            .lock()
            .await
            .logins
            .insert(token.clone(), (email.to_string(), expires));
        Ok(token)
    }

    async fn consume_login_token(&self, token: &str) -> CoreResult<Option<String>> {
        let mut data = self.data.lock().await;
        Ok(data
            .logins
            .remove(token)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(email, _)| email))
    }

    async fn revoke_session(&self, session_id: &str, ttl_seconds: u64) -> CoreResult<()> {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds.max(1));
        self.data
            .lock()
            .await
            .revoked
            .insert(session_id.to_string(), expires);
        Ok(())
    }

    async fn is_revoked(&self, session_id: &str) -> CoreResult<bool> {
        let data = self.data.lock().await;
        Ok(data
            .revoked
            .get(session_id)
            .is_some_and(|expires| *expires > Instant::now()))
    }

    async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> CoreResult<bool> {
        let mut data = self.data.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_seconds.max(0) as u64);

        let entry = data.counters.entry(key.to_string()).or_insert((0, now + window));
        if entry.1 <= now {
            *entry = (0, now + window);
        }
        entry.0 += 1;
        Ok(entry.0 <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(level: i32, min_points: i32, discount_percent: f64) -> LevelRule {
        LevelRule { level, min_points, discount_percent, benefits_text: String::new() }
    }

    #[tokio::test]
    async fn test_products_listed_newest_first() {
        let repos = MemoryStore::new().repositories();
        let first = repos
            .products
            .save_product(ProductDraft { model: "iPhone 12".into(), ..Default::default() }, vec![])
            .await
            .unwrap();
        let second = repos
            .products
            .save_product(ProductDraft { model: "iPhone 15".into(), ..Default::default() }, vec![])
            .await
            .unwrap();

        let listed = repos.products.list_products().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_save_product_replaces_images_only_when_given() {
        let repos = MemoryStore::new().repositories();
        let product = repos
            .products
            .save_product(ProductDraft::default(), vec!["a.jpg".into(), "b.jpg".into()])
            .await
            .unwrap();

        let mut draft = ProductDraft::from(product.clone());
        draft.color = "Azul".into();
        repos.products.save_product(draft.clone(), vec![]).await.unwrap();
        assert_eq!(repos.products.get_product_images(product.id).await.unwrap().len(), 2);

        let updated = repos.products.save_product(draft, vec!["c.jpg".into()]).await.unwrap();
        assert_eq!(updated.color, "Azul");
        assert_eq!(updated.created_at, product.created_at);
        let images = repos.products.get_product_images(product.id).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image_url, "c.jpg");
    }

    #[tokio::test]
    async fn test_update_unknown_product_is_not_found() {
        let repos = MemoryStore::new().repositories();
        let draft = ProductDraft { id: Some(Uuid::new_v4()), ..Default::default() };
        let err = repos.products.save_product(draft, vec![]).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_points_recomputes_level() {
        let repos = MemoryStore::new().repositories();
        repos.levels.upsert_rule(rule(1, 0, 0.0)).await.unwrap();
        repos.levels.upsert_rule(rule(2, 500, 10.0)).await.unwrap();
        repos.levels.upsert_rule(rule(3, 1500, 20.0)).await.unwrap();

        let profile = repos
            .profiles
            .create_profile(NewProfile::first_access("ana@example.com"))
            .await
            .unwrap();
        let admin = Uuid::new_v4();

        let up = repos.points.add_points(profile.id, 1600, "compra", admin).await.unwrap();
        assert_eq!(up.points, 1600);
        assert_eq!(up.level, 3);

        let down = repos.points.add_points(profile.id, -1200, "ajuste", admin).await.unwrap();
        assert_eq!(down.points, 400);
        assert_eq!(down.level, 1);

        let history = repos.points.list_transactions(profile.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "ajuste");
        assert_eq!(history[0].created_by, admin);
    }

    #[tokio::test]
    async fn test_add_points_rejects_overflow() {
        let repos = MemoryStore::new().repositories();
        let profile = repos
            .profiles
            .create_profile(NewProfile::first_access("ana@example.com"))
            .await
            .unwrap();
        let admin = Uuid::new_v4();

        repos.points.add_points(profile.id, i32::MAX, "carga", admin).await.unwrap();
        let err = repos.points.add_points(profile.id, 1, "carga", admin).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        // The failed call leaves balance and ledger untouched.
        let stored = repos.profiles.get_profile(profile.id).await.unwrap().unwrap();
        assert_eq!(stored.points, i32::MAX);
        assert_eq!(repos.points.list_transactions(profile.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repos = MemoryStore::new().repositories();
        repos
            .profiles
            .create_profile(NewProfile::first_access("ana@example.com"))
            .await
            .unwrap();
        let err = repos
            .profiles
            .create_profile(NewProfile::first_access("ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_add_points_unknown_profile() {
        let repos = MemoryStore::new().repositories();
        let err = repos
            .points
            .add_points(Uuid::new_v4(), 10, "compra", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reservation_guards_product_status() {
        let repos = MemoryStore::new().repositories();
        let product = repos.products.save_product(ProductDraft::default(), vec![]).await.unwrap();

        let reservation = repos.reservations.create_reservation(product.id, None).await.unwrap();
        assert_eq!(reservation.status, RESERVATION_PENDING);
        let stored = repos.products.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProductStatus::Reserved);

        let err = repos.reservations.create_reservation(product.id, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let err = repos.reservations.create_reservation(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let listed = repos.reservations.list_reservations().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product.as_ref().unwrap().storage, "128GB");
        assert!(listed[0].requester_email.is_none());
    }

    #[tokio::test]
    async fn test_settings_fall_back_to_defaults() {
        let repos = MemoryStore::new().repositories();
        assert_eq!(repos.settings.get_settings().await.unwrap(), Settings::default());

        repos.settings.update_setting("blue_rate", "1250").await.unwrap();
        assert_eq!(repos.settings.get_settings().await.unwrap().blue_rate, 1250.0);
    }

    #[tokio::test]
    async fn test_login_token_is_single_use() {
        let store = MemorySessionStore::new();
        let token = store.issue_login_token("ana@example.com", 900).await.unwrap();

        assert_eq!(
            store.consume_login_token(&token).await.unwrap().as_deref(),
            Some("ana@example.com")
        );
        assert!(store.consume_login_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_login_token_is_rejected() {
        let store = MemorySessionStore::new();
        let token = store.issue_login_token("ana@example.com", 0).await.unwrap();
        assert!(store.consume_login_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_counts_per_key() {
        let store = MemorySessionStore::new();
        for _ in 0..3 {
            assert!(store.check_rate_limit("a", 3, 600).await.unwrap());
        }
        assert!(!store.check_rate_limit("a", 3, 600).await.unwrap());
        assert!(store.check_rate_limit("b", 3, 600).await.unwrap());
    }

    #[tokio::test]
    async fn test_revocation() {
        let store = MemorySessionStore::new();
        assert!(!store.is_revoked("jti").await.unwrap());
        store.revoke_session("jti", 60).await.unwrap();
        assert!(store.is_revoked("jti").await.unwrap());
    }
}
