//! GPS point entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::gps_point::LatestPosition;
use domain::models::{GpsPoint, GpsSource};

/// Database row mapping for the gps_points table.
#[derive(Debug, Clone, FromRow)]
pub struct GpsPointEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub source: String,
    pub battery_level: Option<i32>,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<GpsPointEntity> for GpsPoint {
    fn from(entity: GpsPointEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy: entity.accuracy,
            altitude: entity.altitude,
            speed: entity.speed,
            heading: entity.heading,
            source: GpsSource::parse(&entity.source).unwrap_or_default(),
            battery_level: entity.battery_level,
            captured_at: entity.captured_at,
            created_at: entity.created_at,
        }
    }
}

/// Latest point per user joined with the user's display name.
#[derive(Debug, Clone, FromRow)]
pub struct LatestPositionEntity {
    pub user_id: Uuid,
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub battery_level: Option<i32>,
    pub captured_at: DateTime<Utc>,
}

impl From<LatestPositionEntity> for LatestPosition {
    fn from(entity: LatestPositionEntity) -> Self {
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy: entity.accuracy,
            battery_level: entity.battery_level,
            captured_at: entity.captured_at,
        }
    }
}
