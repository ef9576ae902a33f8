use istore_shared::{Product, ProductCondition, ProductStatus};
use serde::{Deserialize, Serialize};

/// Catalog search as offered on the storefront home page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the model name. Empty matches everything.
    pub model: String,
    pub condition: Option<ProductCondition>,
    pub status: Option<ProductStatus>,
}

impl ProductFilter {
    /// The home page default: only phones that can still be reserved.
    pub fn storefront() -> Self {
        Self {
            status: Some(ProductStatus::Available),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        let model_ok = product
            .model
            .to_lowercase()
            .contains(&self.model.to_lowercase());
        let condition_ok = self.condition.map_or(true, |c| product.condition == c);
        let status_ok = self.status.map_or(true, |s| product.status == s);

        model_ok && condition_ok && status_ok
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn phone(model: &str, condition: ProductCondition, status: ProductStatus) -> Product {
        Product {
            id: Uuid::new_v4(),
            model: model.to_string(),
            storage: "128GB".to_string(),
            color: "Negro".to_string(),
            condition,
            battery_health: Some(88),
            box_included: true,
            accessories: None,
            warranty_days: 90,
            description: String::new(),
            status,
            base_price_usd: 500.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_storefront_default_hides_reserved() {
        let products = vec![
            phone("iPhone 13", ProductCondition::Used, ProductStatus::Available),
            phone("iPhone 14", ProductCondition::Sealed, ProductStatus::Reserved),
        ];

        let visible = ProductFilter::storefront().apply(products);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].model, "iPhone 13");
    }

    #[test]
    fn test_model_search_is_case_insensitive() {
        let filter = ProductFilter { model: "PRO max".to_string(), ..ProductFilter::default() };
        assert!(filter.matches(&phone("iPhone 15 Pro Max", ProductCondition::Used, ProductStatus::Reserved)));
        assert!(!filter.matches(&phone("iPhone 15 Pro", ProductCondition::Used, ProductStatus::Available)));
    }

    #[test]
    fn test_condition_and_status() {
        let filter = ProductFilter {
            model: String::new(),
            condition: Some(ProductCondition::Sealed),
            status: None,
        };
        assert!(filter.matches(&phone("iPhone 12", ProductCondition::Sealed, ProductStatus::Reserved)));
        assert!(!filter.matches(&phone("iPhone 12", ProductCondition::Used, ProductStatus::Available)));
    }
}
