use async_trait::async_trait;
use chrono::{DateTime, Utc};
use istore_core::{CoreError, CoreResult, ReservationRepository};
use istore_shared::{ProductSummary, Reservation, ReservationSummary, RESERVATION_PENDING};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;

pub struct StoreReservationRepository {
    pool: PgPool,
}

impl StoreReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationSummaryRow {
    id: Uuid,
    product_id: Uuid,
    user_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
    model: Option<String>,
    storage: Option<String>,
    color: Option<String>,
    email: Option<String>,
}

#[async_trait]
impl ReservationRepository for StoreReservationRepository {
    async fn create_reservation(
        &self,
        product_id: Uuid,
        user_id: Option<Uuid>,
    ) -> CoreResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // The status flip is the guard against two holds on the same phone.
        let held: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE products SET status = 'reserved', updated_at = NOW()
            WHERE id = $1 AND status = 'available'
            RETURNING id
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        if held.is_none() {
            let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;

            return Err(match exists {
                Some(_) => CoreError::Conflict(format!("product {} is already reserved", product_id)),
                None => CoreError::NotFound(format!("product {}", product_id)),
            });
        }

        let row: ReservationRow = sqlx::query_as(
            r#"
            INSERT INTO reservations (id, product_id, user_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, user_id, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(user_id)
        .bind(RESERVATION_PENDING)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(row.into())
    }

    async fn list_reservations(&self) -> CoreResult<Vec<ReservationSummary>> {
        let rows: Vec<ReservationSummaryRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.product_id, r.user_id, r.status, r.created_at,
                   p.model, p.storage, p.color, u.email
            FROM reservations r
            LEFT JOIN products p ON p.id = r.product_id
            LEFT JOIN profiles u ON u.id = r.user_id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let product = match (row.model, row.storage, row.color) {
                    (Some(model), Some(storage), Some(color)) => Some(ProductSummary { model, storage, color }),
                    _ => None,
                };
                ReservationSummary {
                    reservation: Reservation {
                        id: row.id,
                        product_id: row.product_id,
                        user_id: row.user_id,
                        status: row.status,
                        created_at: row.created_at,
                    },
                    product,
                    requester_email: row.email,
                }
            })
            .collect())
    }
}
