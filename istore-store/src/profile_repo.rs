use async_trait::async_trait;
use chrono::{DateTime, Utc};
use istore_core::{CoreError, CoreResult, ProfileRepository};
use istore_shared::{NewProfile, Profile};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{corrupt_row, db_error};

pub struct StoreProfileRepository {
    pool: PgPool,
}

impl StoreProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) const PROFILE_COLUMNS: &str = "id, full_name, email, points, level, role, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct ProfileRow {
    id: Uuid,
    full_name: String,
    email: String,
    points: i32,
    level: i32,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = CoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            points: row.points,
            level: row.level,
            role: row.role.parse().map_err(corrupt_row)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ProfileRepository for StoreProfileRepository {
    async fn get_profile(&self, id: Uuid) -> CoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let row: Option<ProfileRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Profile::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE lower(email) = lower($1)", PROFILE_COLUMNS);
        let row: Option<ProfileRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Profile::try_from).transpose()
    }

    async fn create_profile(&self, profile: NewProfile) -> CoreResult<Profile> {
        let sql = format!(
            r#"
            INSERT INTO profiles (id, email, full_name, points, level, role)
            VALUES ($1, $2, $3, 0, 1, $4)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        let row: ProfileRow = sqlx::query_as(&sql)
            .bind(profile.id)
            .bind(&profile.email)
            .bind(&profile.full_name)
            .bind(profile.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        tracing::info!(profile_id = %profile.id, "Profile created");
        Profile::try_from(row)
    }

    async fn list_profiles(&self) -> CoreResult<Vec<Profile>> {
        let sql = format!("SELECT {} FROM profiles ORDER BY created_at DESC", PROFILE_COLUMNS);
        let rows: Vec<ProfileRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(Profile::try_from).collect()
    }
}
