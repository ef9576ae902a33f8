use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductCondition {
    Sealed,
    Used,
}

impl ProductCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCondition::Sealed => "sealed",
            ProductCondition::Used => "used",
        }
    }
}

impl FromStr for ProductCondition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sealed" => Ok(ProductCondition::Sealed),
            "used" => Ok(ProductCondition::Used),
            other => Err(UnknownVariant { kind: "product condition", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Reserved,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Reserved => "reserved",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "reserved" => Ok(ProductStatus::Reserved),
            other => Err(UnknownVariant { kind: "product status", value: other.to_string() }),
        }
    }
}

/// A phone listed in the catalog. Prices are kept in the reference currency (USD).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub model: String,
    pub storage: String,
    pub color: String,
    pub condition: ProductCondition,
    pub battery_health: Option<i32>,
    pub box_included: bool,
    pub accessories: Option<String>,
    pub warranty_days: i32,
    pub description: String,
    pub status: ProductStatus,
    pub base_price_usd: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
}

/// Editable product fields. A draft without `id` is inserted, otherwise the
/// existing row is updated. Timestamps are owned by the store and never
/// accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDraft {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub model: String,
    pub storage: String,
    pub color: String,
    pub condition: ProductCondition,
    #[serde(default)]
    pub battery_health: Option<i32>,
    #[serde(default = "default_box_included")]
    pub box_included: bool,
    #[serde(default)]
    pub accessories: Option<String>,
    #[serde(default = "default_warranty_days")]
    pub warranty_days: i32,
    #[serde(default)]
    pub description: String,
    pub status: ProductStatus,
    pub base_price_usd: f64,
}

const DEFAULT_WARRANTY_DAYS: i32 = 90;

fn default_box_included() -> bool {
    true
}

fn default_warranty_days() -> i32 {
    DEFAULT_WARRANTY_DAYS
}

impl Default for ProductDraft {
    /// Blank form shown to an admin adding a new phone.
    fn default() -> Self {
        Self {
            id: None,
            model: "iPhone ".to_string(),
            storage: "128GB".to_string(),
            color: "Negro".to_string(),
            condition: ProductCondition::Used,
            battery_health: None,
            box_included: default_box_included(),
            accessories: None,
            warranty_days: DEFAULT_WARRANTY_DAYS,
            description: String::new(),
            status: ProductStatus::Available,
            base_price_usd: 0.0,
        }
    }
}

impl ProductDraft {
    pub fn into_product(self, id: Uuid, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Product {
        Product {
            id,
            model: self.model,
            storage: self.storage,
            color: self.color,
            condition: self.condition,
            battery_health: self.battery_health,
            box_included: self.box_included,
            accessories: self.accessories,
            warranty_days: self.warranty_days,
            description: self.description,
            status: self.status,
            base_price_usd: self.base_price_usd,
            created_at,
            updated_at,
        }
    }
}

impl From<Product> for ProductDraft {
    fn from(p: Product) -> Self {
        Self {
            id: Some(p.id),
            model: p.model,
            storage: p.storage,
            color: p.color,
            condition: p.condition,
            battery_health: p.battery_health,
            box_included: p.box_included,
            accessories: p.accessories,
            warranty_days: p.warranty_days,
            description: p.description,
            status: p.status,
            base_price_usd: p.base_price_usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(serde_json::to_string(&ProductCondition::Sealed).unwrap(), "\"sealed\"");
        assert_eq!(serde_json::to_string(&ProductStatus::Reserved).unwrap(), "\"reserved\"");
        assert_eq!("used".parse::<ProductCondition>().unwrap(), ProductCondition::Used);
        let err = "broken".parse::<ProductStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown product status: broken");
    }

    #[test]
    fn test_draft_ignores_timestamps() {
        let body = serde_json::json!({
            "model": "iPhone 13",
            "storage": "256GB",
            "color": "Azul",
            "condition": "sealed",
            "status": "available",
            "base_price_usd": 650.0,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });

        let draft: ProductDraft = serde_json::from_value(body).unwrap();
        assert!(draft.id.is_none());
        // Omitted form fields take the new-product template values.
        assert_eq!(draft.warranty_days, 90);
        assert!(draft.box_included);
        assert_eq!(draft.condition, ProductCondition::Sealed);
    }

    #[test]
    fn test_new_product_form_defaults() {
        let draft = ProductDraft::default();
        assert_eq!(draft.model, "iPhone ");
        assert_eq!(draft.warranty_days, 90);
        assert!(draft.box_included);
        assert_eq!(draft.status, ProductStatus::Available);
    }
}
