use async_trait::async_trait;
use chrono::{DateTime, Utc};
use istore_catalog::LevelTable;
use istore_core::{CoreError, CoreResult, PointsRepository};
use istore_shared::{LevelRule, PointsTransaction, Profile};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;
use crate::profile_repo::{ProfileRow, PROFILE_COLUMNS};
use crate::settings_repo::{LevelRuleRow, LIST_RULES_SQL};

pub struct StorePointsRepository {
    pool: PgPool,
}

impl StorePointsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    delta_points: i32,
    reason: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl PointsRepository for StorePointsRepository {
    async fn add_points(
        &self,
        user_id: Uuid,
        delta: i32,
        reason: &str,
        admin_id: Uuid,
    ) -> CoreResult<Profile> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let points: Option<i32> = sqlx::query_scalar(
            "UPDATE profiles SET points = points + $1 WHERE id = $2 RETURNING points",
        )
        .bind(delta)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let points = points.ok_or_else(|| CoreError::NotFound(format!("profile {}", user_id)))?;

        sqlx::query(
            r#"
            INSERT INTO points_transactions (id, user_id, delta_points, reason, created_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(delta)
        .bind(reason)
        .bind(admin_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let rules: Vec<LevelRuleRow> = sqlx::query_as(LIST_RULES_SQL)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;
        let table = LevelTable::new(rules.into_iter().map(LevelRule::from).collect());

        // Empty rule table: the level stays where it is.
        let sql = format!(
            "UPDATE profiles SET level = COALESCE($1, level) WHERE id = $2 RETURNING {}",
            PROFILE_COLUMNS
        );
        let row: ProfileRow = sqlx::query_as(&sql)
            .bind(table.level_for_points(points))
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        let profile = Profile::try_from(row)?;
        tracing::info!(
            user_id = %user_id,
            admin_id = %admin_id,
            delta,
            points = profile.points,
            level = profile.level,
            "Points recorded"
        );
        Ok(profile)
    }

    async fn list_transactions(&self, user_id: Uuid) -> CoreResult<Vec<PointsTransaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, delta_points, reason, created_by, created_at
            FROM points_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| PointsTransaction {
                id: r.id,
                user_id: r.user_id,
                delta_points: r.delta_points,
                reason: r.reason,
                created_by: r.created_by,
                created_at: r.created_at,
            })
            .collect())
    }
}
