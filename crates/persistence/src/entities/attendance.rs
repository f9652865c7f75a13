//! Attendance record entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{AttendanceRecord, AttendanceSource};

/// Database row mapping for the attendance_records table.
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
    pub clock_in_source: String,
    pub clock_out_source: Option<String>,
    pub geofence_id: Option<Uuid>,
    pub clock_in_latitude: Option<f64>,
    pub clock_in_longitude: Option<f64>,
    pub clock_out_latitude: Option<f64>,
    pub clock_out_longitude: Option<f64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AttendanceEntity> for AttendanceRecord {
    fn from(entity: AttendanceEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            clock_in_at: entity.clock_in_at,
            clock_out_at: entity.clock_out_at,
            clock_in_source: AttendanceSource::parse(&entity.clock_in_source)
                .unwrap_or(AttendanceSource::Manual),
            clock_out_source: entity
                .clock_out_source
                .as_deref()
                .and_then(AttendanceSource::parse),
            geofence_id: entity.geofence_id,
            clock_in_latitude: entity.clock_in_latitude,
            clock_in_longitude: entity.clock_in_longitude,
            clock_out_latitude: entity.clock_out_latitude,
            clock_out_longitude: entity.clock_out_longitude,
            note: entity.note,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
