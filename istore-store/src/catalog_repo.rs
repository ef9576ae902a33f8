use async_trait::async_trait;
use chrono::{DateTime, Utc};
use istore_core::{CoreError, CoreResult, ProductRepository};
use istore_shared::{Product, ProductDraft, ProductImage};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::{corrupt_row, db_error};

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, model, storage, color, condition, battery_health, box_included, \
     accessories, warranty_days, description, status, base_price_usd, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    model: String,
    storage: String,
    color: String,
    condition: String,
    battery_health: Option<i32>,
    box_included: bool,
    accessories: Option<String>,
    warranty_days: i32,
    description: String,
    status: String,
    base_price_usd: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = CoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            model: row.model,
            storage: row.storage,
            color: row.color,
            condition: row.condition.parse().map_err(corrupt_row)?,
            battery_health: row.battery_health,
            box_included: row.box_included,
            accessories: row.accessories,
            warranty_days: row.warranty_days,
            description: row.description,
            status: row.status.parse().map_err(corrupt_row)?,
            base_price_usd: row.base_price_usd,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    product_id: Uuid,
    image_url: String,
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn list_products(&self) -> CoreResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get_product(&self, id: Uuid) -> CoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Product::try_from).transpose()
    }

    async fn get_product_images(&self, product_id: Uuid) -> CoreResult<Vec<ProductImage>> {
        let rows: Vec<ImageRow> = sqlx::query_as(
            "SELECT id, product_id, image_url FROM product_images WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| ProductImage { id: r.id, product_id: r.product_id, image_url: r.image_url })
            .collect())
    }

    async fn save_product(&self, draft: ProductDraft, images: Vec<String>) -> CoreResult<Product> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let insert_sql = format!(
            r#"
            INSERT INTO products (id, model, storage, color, condition, battery_health, box_included,
                                  accessories, warranty_days, description, status, base_price_usd)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let update_sql = format!(
            r#"
            UPDATE products
            SET model = $2, storage = $3, color = $4, condition = $5, battery_health = $6,
                box_included = $7, accessories = $8, warranty_days = $9, description = $10,
                status = $11, base_price_usd = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        let query = match draft.id {
            None => sqlx::query_as::<Postgres, ProductRow>(&insert_sql).bind(Uuid::new_v4()),
            Some(id) => sqlx::query_as::<Postgres, ProductRow>(&update_sql).bind(id),
        };

        let row = query
            .bind(&draft.model)
            .bind(&draft.storage)
            .bind(&draft.color)
            .bind(draft.condition.as_str())
            .bind(draft.battery_health)
            .bind(draft.box_included)
            .bind(&draft.accessories)
            .bind(draft.warranty_days)
            .bind(&draft.description)
            .bind(draft.status.as_str())
            .bind(draft.base_price_usd)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;

        let product = match row {
            Some(row) => Product::try_from(row)?,
            None => {
                let id = draft.id.map(|id| id.to_string()).unwrap_or_default();
                return Err(CoreError::NotFound(format!("product {}", id)));
            }
        };

        if !images.is_empty() {
            sqlx::query("DELETE FROM product_images WHERE product_id = $1")
                .bind(product.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            for url in &images {
                sqlx::query("INSERT INTO product_images (id, product_id, image_url) VALUES ($1, $2, $3)")
                    .bind(Uuid::new_v4())
                    .bind(product.id)
                    .bind(url)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
            }
        }

        tx.commit().await.map_err(db_error)?;
        tracing::info!(product_id = %product.id, images = images.len(), "Product saved");
        Ok(product)
    }
}
