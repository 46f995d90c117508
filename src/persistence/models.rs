//! Database row models.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    BadgeFields, BadgeId, BadgeRecord, TimerPosition, TimerSize, UrgencyNotification,
};
use crate::error::BadgeError;

/// A row from the `timer_badges` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BadgeRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique timer name.
    pub timer_name: String,
    /// `MM/DD/YYYY` or empty.
    pub start_date: String,
    /// `HH:MM` or empty.
    pub start_time: String,
    /// `MM/DD/YYYY` or empty.
    pub end_date: String,
    /// `HH:MM` or empty.
    pub end_time: String,
    /// Promotion text.
    pub promotion_description: String,
    /// `#RRGGBB`.
    pub color: String,
    /// Size variant name.
    pub timer_size: String,
    /// Position variant name.
    pub timer_position: String,
    /// Urgency mode variant name.
    pub urgency_notification: String,
    /// Threshold in seconds (`BIGINT`, never negative).
    pub urgency_trigger_threshold: i64,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BadgeRow> for BadgeRecord {
    type Error = BadgeError;

    fn try_from(row: BadgeRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: &dyn std::fmt::Display| {
            BadgeError::PersistenceError(format!("corrupt badge row {id}: {e}"))
        };
        let fields = BadgeFields {
            timer_size: row
                .timer_size
                .parse::<TimerSize>()
                .map_err(|e| corrupt(&e))?,
            timer_position: row
                .timer_position
                .parse::<TimerPosition>()
                .map_err(|e| corrupt(&e))?,
            urgency_notification: row
                .urgency_notification
                .parse::<UrgencyNotification>()
                .map_err(|e| corrupt(&e))?,
            urgency_trigger_threshold: u64::try_from(row.urgency_trigger_threshold)
                .map_err(|e| corrupt(&e))?,
            timer_name: row.timer_name,
            start_date: row.start_date,
            start_time: row.start_time,
            end_date: row.end_date,
            end_time: row.end_time,
            promotion_description: row.promotion_description,
            color: row.color,
        };
        Ok(Self {
            id: BadgeId::from_uuid(id),
            fields,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
