//! Time entry entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::TimeEntry;

/// Database row mapping for the time_entries table.
#[derive(Debug, Clone, FromRow)]
pub struct TimeEntryEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub note: Option<String>,
}

impl From<TimeEntryEntity> for TimeEntry {
    fn from(entity: TimeEntryEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            task_id: entity.task_id,
            started_at: entity.started_at,
            stopped_at: entity.stopped_at,
            duration_secs: entity.duration_secs,
            note: entity.note,
        }
    }
}
