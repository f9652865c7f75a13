//! Geofence entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::geofence::GeofenceShapeKind;
use domain::models::{Geofence, GeofenceShape};
use domain::services::GeoPoint;

/// Database row mapping for the geofences table.
#[derive(Debug, Clone, FromRow)]
pub struct GeofenceEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub shape: String,
    pub center_latitude: Option<f64>,
    pub center_longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub vertices: Option<serde_json::Value>, // JSONB array of {latitude, longitude}
    pub auto_clock_in: bool,
    pub auto_clock_out: bool,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl GeofenceEntity {
    fn to_shape(&self) -> GeofenceShape {
        match GeofenceShapeKind::parse(&self.shape) {
            Some(GeofenceShapeKind::Polygon) => GeofenceShape::Polygon {
                vertices: self
                    .vertices
                    .clone()
                    .and_then(|v| serde_json::from_value::<Vec<GeoPoint>>(v).ok())
                    .unwrap_or_default(),
            },
            _ => GeofenceShape::Circle {
                center: GeoPoint::new(
                    self.center_latitude.unwrap_or_default(),
                    self.center_longitude.unwrap_or_default(),
                ),
                radius_meters: self.radius_meters.unwrap_or_default(),
            },
        }
    }
}

impl From<GeofenceEntity> for Geofence {
    fn from(entity: GeofenceEntity) -> Self {
        let shape = entity.to_shape();
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            shape,
            auto_clock_in: entity.auto_clock_in,
            auto_clock_out: entity.auto_clock_out,
            active: entity.active,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at: entity.deleted_at,
        }
    }
}

/// Column values for a shape, in insert order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeColumns {
    pub shape: &'static str,
    pub center_latitude: Option<f64>,
    pub center_longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub vertices: Option<serde_json::Value>,
}

impl From<&GeofenceShape> for ShapeColumns {
    fn from(shape: &GeofenceShape) -> Self {
        match shape {
            GeofenceShape::Circle {
                center,
                radius_meters,
            } => Self {
                shape: GeofenceShapeKind::Circle.as_str(),
                center_latitude: Some(center.latitude),
                center_longitude: Some(center.longitude),
                radius_meters: Some(*radius_meters),
                vertices: None,
            },
            GeofenceShape::Polygon { vertices } => Self {
                shape: GeofenceShapeKind::Polygon.as_str(),
                center_latitude: None,
                center_longitude: None,
                radius_meters: None,
                vertices: serde_json::to_value(vertices).ok(),
            },
        }
    }
}

/// Database row mapping for the geofence_states table.
#[derive(Debug, Clone, FromRow)]
pub struct GeofenceStateEntity {
    pub user_id: Uuid,
    pub geofence_id: Uuid,
    pub inside: bool,
    pub last_point_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}
