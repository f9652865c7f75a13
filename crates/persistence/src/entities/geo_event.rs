//! Geo-event entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{GeoEvent, GeoEventAction, GeoEventType};

/// Row from geo_events, optionally joined with the geofence name.
#[derive(Debug, Clone, FromRow)]
pub struct GeoEventEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub geofence_id: Uuid,
    #[sqlx(default)]
    pub geofence_name: Option<String>,
    pub event_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub gps_point_id: Option<i64>,
    pub action: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<GeoEventEntity> for GeoEvent {
    fn from(entity: GeoEventEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            geofence_id: entity.geofence_id,
            geofence_name: entity.geofence_name,
            event_type: GeoEventType::parse(&entity.event_type).unwrap_or(GeoEventType::Enter),
            latitude: entity.latitude,
            longitude: entity.longitude,
            gps_point_id: entity.gps_point_id,
            action: GeoEventAction::parse(&entity.action).unwrap_or_default(),
            occurred_at: entity.occurred_at,
            created_at: entity.created_at,
        }
    }
}
