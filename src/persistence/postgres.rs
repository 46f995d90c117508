//! PostgreSQL implementation of the badge store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::BadgeStore;
use super::models::BadgeRow;
use crate::domain::{BadgeFields, BadgeId, BadgeRecord};
use crate::error::BadgeError;

const SELECT_COLUMNS: &str = "id, timer_name, start_date, start_time, end_date, end_time, \
     promotion_description, color, timer_size, timer_position, urgency_notification, \
     urgency_trigger_threshold, created_at, updated_at";

/// PostgreSQL-backed badge store using `sqlx::PgPool`.
///
/// Name uniqueness is enforced by the `timer_badges_timer_name_key`
/// constraint; violations surface as [`BadgeError::DuplicateName`].
#[derive(Debug, Clone)]
pub struct PostgresBadgeStore {
    pool: PgPool,
}

impl PostgresBadgeStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`BadgeError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), BadgeError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BadgeError::PersistenceError(e.to_string()))
    }
}

/// Maps a write error, turning unique violations into `DuplicateName`.
fn map_write_error(err: sqlx::Error, timer_name: &str) -> BadgeError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            BadgeError::DuplicateName(timer_name.to_string())
        }
        _ => BadgeError::PersistenceError(err.to_string()),
    }
}

fn threshold_param(fields: &BadgeFields) -> Result<i64, BadgeError> {
    i64::try_from(fields.urgency_trigger_threshold)
        .map_err(|_| BadgeError::InvalidInput("Urgency trigger threshold is too large".to_string()))
}

#[async_trait]
impl BadgeStore for PostgresBadgeStore {
    async fn insert(&self, record: BadgeRecord) -> Result<BadgeRecord, BadgeError> {
        let f = &record.fields;
        let row = sqlx::query_as::<_, BadgeRow>(&format!(
            "INSERT INTO timer_badges (id, timer_name, start_date, start_time, end_date, end_time, \
             promotion_description, color, timer_size, timer_position, urgency_notification, \
             urgency_trigger_threshold, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(record.id.as_uuid())
        .bind(&f.timer_name)
        .bind(&f.start_date)
        .bind(&f.start_time)
        .bind(&f.end_date)
        .bind(&f.end_time)
        .bind(&f.promotion_description)
        .bind(&f.color)
        .bind(f.timer_size.as_str())
        .bind(f.timer_position.as_str())
        .bind(f.urgency_notification.as_str())
        .bind(threshold_param(f)?)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &f.timer_name))?;

        BadgeRecord::try_from(row)
    }

    async fn list(&self) -> Result<Vec<BadgeRecord>, BadgeError> {
        let rows = sqlx::query_as::<_, BadgeRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM timer_badges ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BadgeError::PersistenceError(e.to_string()))?;

        rows.into_iter().map(BadgeRecord::try_from).collect()
    }

    async fn get(&self, id: BadgeId) -> Result<BadgeRecord, BadgeError> {
        let row = sqlx::query_as::<_, BadgeRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM timer_badges WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BadgeError::PersistenceError(e.to_string()))?
        .ok_or_else(|| BadgeError::NotFound(id.to_string()))?;

        BadgeRecord::try_from(row)
    }

    async fn replace(&self, id: BadgeId, fields: BadgeFields) -> Result<BadgeRecord, BadgeError> {
        let row = sqlx::query_as::<_, BadgeRow>(&format!(
            "UPDATE timer_badges SET timer_name = $2, start_date = $3, start_time = $4, \
             end_date = $5, end_time = $6, promotion_description = $7, color = $8, \
             timer_size = $9, timer_position = $10, urgency_notification = $11, \
             urgency_trigger_threshold = $12, updated_at = $13 \
             WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&fields.timer_name)
        .bind(&fields.start_date)
        .bind(&fields.start_time)
        .bind(&fields.end_date)
        .bind(&fields.end_time)
        .bind(&fields.promotion_description)
        .bind(&fields.color)
        .bind(fields.timer_size.as_str())
        .bind(fields.timer_position.as_str())
        .bind(fields.urgency_notification.as_str())
        .bind(threshold_param(&fields)?)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &fields.timer_name))?
        .ok_or_else(|| BadgeError::NotFound(id.to_string()))?;

        BadgeRecord::try_from(row)
    }

    async fn remove(&self, id: BadgeId) -> Result<BadgeRecord, BadgeError> {
        let row = sqlx::query_as::<_, BadgeRow>(&format!(
            "DELETE FROM timer_badges WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BadgeError::PersistenceError(e.to_string()))?
        .ok_or_else(|| BadgeError::NotFound(id.to_string()))?;

        BadgeRecord::try_from(row)
    }
}
