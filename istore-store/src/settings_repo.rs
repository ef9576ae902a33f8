use async_trait::async_trait;
use istore_core::{CoreResult, LevelRuleRepository, SettingsRepository};
use istore_shared::{LevelRule, Settings};
use sqlx::PgPool;

use crate::db_error;

pub struct StoreSettingsRepository {
    pool: PgPool,
}

impl StoreSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for StoreSettingsRepository {
    async fn get_settings(&self) -> CoreResult<Settings> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(Settings::from_pairs(rows))
    }

    async fn update_setting(&self, key: &str, value: &str) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        tracing::info!(key, "Setting updated");
        Ok(())
    }
}

pub struct StoreLevelRuleRepository {
    pool: PgPool,
}

impl StoreLevelRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LevelRuleRow {
    level: i32,
    min_points: i32,
    discount_percent: f64,
    benefits_text: String,
}

impl From<LevelRuleRow> for LevelRule {
    fn from(row: LevelRuleRow) -> Self {
        LevelRule {
            level: row.level,
            min_points: row.min_points,
            discount_percent: row.discount_percent,
            benefits_text: row.benefits_text,
        }
    }
}

pub(crate) const LIST_RULES_SQL: &str =
    "SELECT level, min_points, discount_percent, benefits_text FROM level_rules ORDER BY level ASC";

#[async_trait]
impl LevelRuleRepository for StoreLevelRuleRepository {
    async fn list_rules(&self) -> CoreResult<Vec<LevelRule>> {
        let rows: Vec<LevelRuleRow> = sqlx::query_as(LIST_RULES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(LevelRule::from).collect())
    }

    async fn upsert_rule(&self, rule: LevelRule) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO level_rules (level, min_points, discount_percent, benefits_text)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (level) DO UPDATE
            SET min_points = EXCLUDED.min_points,
                discount_percent = EXCLUDED.discount_percent,
                benefits_text = EXCLUDED.benefits_text
            "#,
        )
        .bind(rule.level)
        .bind(rule.min_points)
        .bind(rule.discount_percent)
        .bind(&rule.benefits_text)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        tracing::info!(level = rule.level, discount = rule.discount_percent, "Level rule saved");
        Ok(())
    }
}
