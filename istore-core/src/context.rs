use istore_catalog::{LevelTable, PriceQuote, PriceVisibility};
use istore_shared::{Product, Profile};
use uuid::Uuid;

use crate::{CoreResult, Repositories};

/// Everything a storefront view needs to render prices for one viewer.
///
/// Built in one go by [`Repositories::load_context`] and never patched in place;
/// a refresh means loading a new one.
#[derive(Debug, Clone)]
pub struct StorefrontContext {
    pub viewer: Option<Profile>,
    pub viewing_as_level: Option<i32>,
    pub blue_rate: f64,
    pub whatsapp_number: String,
    pub levels: LevelTable,
}

impl StorefrontContext {
    pub fn is_admin(&self) -> bool {
        self.viewer.as_ref().map_or(false, Profile::is_admin)
    }

    pub fn price_visibility(&self) -> PriceVisibility {
        self.levels
            .resolve(self.viewer.as_ref().map(|p| p.level), self.viewing_as_level)
    }

    /// Price shown on cards and detail pages; `None` for anonymous visitors.
    pub fn quote(&self, product: &Product) -> Option<PriceQuote> {
        match self.price_visibility() {
            PriceVisibility::Hidden => None,
            PriceVisibility::Visible { discount_percent } => Some(PriceQuote::compute(
                product.base_price_usd,
                discount_percent,
                self.blue_rate,
            )),
        }
    }

    /// Price quoted in outgoing messages, computed at 0% for visitors.
    pub fn message_quote(&self, product: &Product) -> PriceQuote {
        PriceQuote::compute(
            product.base_price_usd,
            self.price_visibility().discount_or_zero(),
            self.blue_rate,
        )
    }
}

impl Repositories {
    /// Loads the viewer's profile, settings and level rules into a fresh context.
    /// `view_as_level` only takes effect for admins.
    pub async fn load_context(
        &self,
        viewer_id: Option<Uuid>,
        view_as_level: Option<i32>,
    ) -> CoreResult<StorefrontContext> {
        let viewer = match viewer_id {
            Some(id) => self.profiles.get_profile(id).await?,
            None => None,
        };
        let settings = self.settings.get_settings().await?;
        let rules = self.levels.list_rules().await?;

        let is_admin = viewer.as_ref().map_or(false, Profile::is_admin);
        if view_as_level.is_some() && !is_admin {
            tracing::debug!("Ignoring view_as_level for non-admin viewer");
        }

        Ok(StorefrontContext {
            viewer,
            viewing_as_level: view_as_level.filter(|_| is_admin),
            blue_rate: settings.blue_rate,
            whatsapp_number: settings.whatsapp_number,
            levels: LevelTable::new(rules),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use istore_shared::{LevelRule, ProductCondition, ProductStatus, UserRole};

    fn context(viewer: Option<Profile>, viewing_as_level: Option<i32>) -> StorefrontContext {
        StorefrontContext {
            viewer,
            viewing_as_level,
            blue_rate: 1200.0,
            whatsapp_number: "5491100000000".to_string(),
            levels: LevelTable::new(vec![
                LevelRule { level: 1, min_points: 0, discount_percent: 0.0, benefits_text: String::new() },
                LevelRule { level: 2, min_points: 500, discount_percent: 10.0, benefits_text: String::new() },
            ]),
        }
    }

    fn profile(level: i32, role: UserRole) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: "juan".to_string(),
            email: "juan@example.com".to_string(),
            points: 0,
            level,
            role,
            created_at: Utc::now(),
        }
    }

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            model: "iPhone 13".to_string(),
            storage: "128GB".to_string(),
            color: "Negro".to_string(),
            condition: ProductCondition::Used,
            battery_health: Some(90),
            box_included: false,
            accessories: None,
            warranty_days: 90,
            description: String::new(),
            status: ProductStatus::Available,
            base_price_usd: 100.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_anonymous_gets_no_quote() {
        let ctx = context(None, None);
        assert!(ctx.quote(&product()).is_none());
        assert_eq!(ctx.message_quote(&product()).usd, 100.0);
    }

    #[test]
    fn test_user_level_discount() {
        let ctx = context(Some(profile(2, UserRole::User)), None);
        let quote = ctx.quote(&product()).unwrap();
        assert_eq!(quote.usd, 90.0);
        assert_eq!(quote.ars, 108000.0);
    }

    #[test]
    fn test_admin_simulated_level() {
        let ctx = context(Some(profile(1, UserRole::Admin)), Some(2));
        assert!(ctx.is_admin());
        assert_eq!(ctx.quote(&product()).unwrap().discount_percent, 10.0);
    }
}
