//! Geofence domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::services::geometry::{
    distinct_vertex_count, haversine_distance_meters, point_in_circle, point_in_polygon,
    ring_area, GeoPoint,
};

/// Smallest accepted circle radius in meters.
pub const MIN_RADIUS_METERS: f64 = 10.0;
/// Largest accepted circle radius in meters.
pub const MAX_RADIUS_METERS: f64 = 50_000.0;
/// Polygon vertex bounds.
pub const MIN_POLYGON_VERTICES: usize = 3;
pub const MAX_POLYGON_VERTICES: usize = 100;

/// Geofence validation failures.
#[derive(Debug, Error, PartialEq)]
pub enum GeofenceError {
    #[error("radius_meters must be between 10 and 50000")]
    RadiusOutOfRange,

    #[error("polygon must have between 3 and 100 distinct vertices")]
    VertexCount,

    #[error("polygon vertices must not be collinear")]
    ZeroArea,

    #[error("coordinate out of range: {0}")]
    CoordinateOutOfRange(String),

    #[error("{0} is required for {1} geofences")]
    MissingField(&'static str, &'static str),
}

/// Discriminant for the stored `shape` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeofenceShapeKind {
    Circle,
    Polygon,
}

impl GeofenceShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Polygon => "polygon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "circle" => Some(Self::Circle),
            "polygon" => Some(Self::Polygon),
            _ => None,
        }
    }
}

/// The region a geofence covers.
#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceShape {
    Circle { center: GeoPoint, radius_meters: f64 },
    Polygon { vertices: Vec<GeoPoint> },
}

impl GeofenceShape {
    pub fn kind(&self) -> GeofenceShapeKind {
        match self {
            Self::Circle { .. } => GeofenceShapeKind::Circle,
            Self::Polygon { .. } => GeofenceShapeKind::Polygon,
        }
    }

    /// Membership test. Boundaries count as inside for both shapes.
    pub fn contains(&self, point: GeoPoint) -> bool {
        match self {
            Self::Circle {
                center,
                radius_meters,
            } => point_in_circle(point, *center, *radius_meters),
            Self::Polygon { vertices } => point_in_polygon(point, vertices),
        }
    }

    /// Checks the size and coordinate constraints for the shape.
    pub fn validate(&self) -> Result<(), GeofenceError> {
        match self {
            Self::Circle {
                center,
                radius_meters,
            } => {
                check_coordinate(*center)?;
                if !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(radius_meters) {
                    return Err(GeofenceError::RadiusOutOfRange);
                }
                Ok(())
            }
            Self::Polygon { vertices } => {
                let count = distinct_vertex_count(vertices);
                if !(MIN_POLYGON_VERTICES..=MAX_POLYGON_VERTICES).contains(&count) {
                    return Err(GeofenceError::VertexCount);
                }
                for vertex in vertices {
                    check_coordinate(*vertex)?;
                }
                if ring_area(vertices) <= 0.0 {
                    return Err(GeofenceError::ZeroArea);
                }
                Ok(())
            }
        }
    }

    /// Representative point: the circle center or the vertex centroid.
    pub fn anchor(&self) -> GeoPoint {
        match self {
            Self::Circle { center, .. } => *center,
            Self::Polygon { vertices } => {
                let n = vertices.len().max(1) as f64;
                let (lat, lon) = vertices.iter().fold((0.0, 0.0), |(lat, lon), v| {
                    (lat + v.latitude, lon + v.longitude)
                });
                GeoPoint::new(lat / n, lon / n)
            }
        }
    }
}

fn check_coordinate(point: GeoPoint) -> Result<(), GeofenceError> {
    shared::validation::validate_latitude(point.latitude)
        .and_then(|_| shared::validation::validate_longitude(point.longitude))
        .map_err(|e| {
            GeofenceError::CoordinateOutOfRange(
                e.message.map(|m| m.to_string()).unwrap_or_default(),
            )
        })
}

/// A named region used to derive enter/exit events and attendance automation.
#[derive(Debug, Clone)]
pub struct Geofence {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub shape: GeofenceShape,
    pub auto_clock_in: bool,
    pub auto_clock_out: bool,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Geofence {
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.shape.contains(point)
    }

    /// Active and not soft-deleted.
    pub fn is_evaluable(&self) -> bool {
        self.active && self.deleted_at.is_none()
    }
}

fn default_true() -> bool {
    true
}

/// Request payload for creating a geofence.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGeofenceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub shape: GeofenceShapeKind,

    pub center_latitude: Option<f64>,
    pub center_longitude: Option<f64>,
    pub radius_meters: Option<f64>,

    pub vertices: Option<Vec<GeoPoint>>,

    #[serde(default)]
    pub auto_clock_in: bool,

    #[serde(default)]
    pub auto_clock_out: bool,

    #[serde(default = "default_true")]
    pub active: bool,
}

impl CreateGeofenceRequest {
    /// Builds and validates the shape from the flat request fields.
    pub fn to_shape(&self) -> Result<GeofenceShape, GeofenceError> {
        let shape = build_shape(
            self.shape,
            self.center_latitude,
            self.center_longitude,
            self.radius_meters,
            self.vertices.clone(),
        )?;
        shape.validate()?;
        Ok(shape)
    }
}

fn build_shape(
    kind: GeofenceShapeKind,
    center_latitude: Option<f64>,
    center_longitude: Option<f64>,
    radius_meters: Option<f64>,
    vertices: Option<Vec<GeoPoint>>,
) -> Result<GeofenceShape, GeofenceError> {
    match kind {
        GeofenceShapeKind::Circle => {
            let latitude =
                center_latitude.ok_or(GeofenceError::MissingField("center_latitude", "circle"))?;
            let longitude =
                center_longitude.ok_or(GeofenceError::MissingField("center_longitude", "circle"))?;
            let radius_meters =
                radius_meters.ok_or(GeofenceError::MissingField("radius_meters", "circle"))?;
            Ok(GeofenceShape::Circle {
                center: GeoPoint::new(latitude, longitude),
                radius_meters,
            })
        }
        GeofenceShapeKind::Polygon => {
            let vertices = vertices.ok_or(GeofenceError::MissingField("vertices", "polygon"))?;
            Ok(GeofenceShape::Polygon { vertices })
        }
    }
}

/// Request payload for updating a geofence (partial update).
///
/// Geometry fields replace the matching parts of the current shape. Sending
/// `shape` switches the kind and requires the full geometry for it.
/// `description: null` clears the description.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGeofenceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,

    pub shape: Option<GeofenceShapeKind>,
    pub center_latitude: Option<f64>,
    pub center_longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub vertices: Option<Vec<GeoPoint>>,

    pub auto_clock_in: Option<bool>,
    pub auto_clock_out: Option<bool>,
    pub active: Option<bool>,
}

impl UpdateGeofenceRequest {
    /// Description after the update.
    pub fn merged_description<'a>(&'a self, current: Option<&'a str>) -> Option<&'a str> {
        match &self.description {
            Some(new) => new.as_deref(),
            None => current,
        }
    }

    /// Applies the geometry fields to `current` and validates the result.
    pub fn merge_shape(&self, current: &GeofenceShape) -> Result<GeofenceShape, GeofenceError> {
        let shape = match (self.shape, current) {
            (Some(kind), _) if kind != current.kind() => build_shape(
                kind,
                self.center_latitude,
                self.center_longitude,
                self.radius_meters,
                self.vertices.clone(),
            )?,
            (
                _,
                GeofenceShape::Circle {
                    center,
                    radius_meters,
                },
            ) => GeofenceShape::Circle {
                center: GeoPoint::new(
                    self.center_latitude.unwrap_or(center.latitude),
                    self.center_longitude.unwrap_or(center.longitude),
                ),
                radius_meters: self.radius_meters.unwrap_or(*radius_meters),
            },
            (_, GeofenceShape::Polygon { vertices }) => GeofenceShape::Polygon {
                vertices: self.vertices.clone().unwrap_or_else(|| vertices.clone()),
            },
        };
        shape.validate()?;
        Ok(shape)
    }
}

/// Response payload for geofence operations.
#[derive(Debug, Clone, Serialize)]
pub struct GeofenceResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shape: GeofenceShapeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<GeoPoint>>,
    pub auto_clock_in: bool,
    pub auto_clock_out: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Geofence> for GeofenceResponse {
    fn from(g: Geofence) -> Self {
        let kind = g.shape.kind();
        let (center, radius, vertices) = match g.shape {
            GeofenceShape::Circle {
                center,
                radius_meters,
            } => (Some(center), Some(radius_meters), None),
            GeofenceShape::Polygon { vertices } => (None, None, Some(vertices)),
        };

        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            shape: kind,
            center_latitude: center.map(|c| c.latitude),
            center_longitude: center.map(|c| c.longitude),
            radius_meters: radius,
            vertices,
            auto_clock_in: g.auto_clock_in,
            auto_clock_out: g.auto_clock_out,
            active: g.active,
            created_at: g.created_at,
            updated_at: g.updated_at,
            deleted_at: g.deleted_at,
        }
    }
}

/// Response for listing geofences.
#[derive(Debug, Clone, Serialize)]
pub struct ListGeofencesResponse {
    pub geofences: Vec<GeofenceResponse>,
    pub total: usize,
}

/// Query parameters for listing geofences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGeofencesQuery {
    pub active: Option<bool>,
    #[serde(default)]
    pub include_deleted: bool,
}

/// Stateless membership check for a coordinate.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckPointRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

/// A geofence that contains the checked coordinate.
#[derive(Debug, Clone, Serialize)]
pub struct GeofenceMatch {
    pub id: Uuid,
    pub name: String,
    pub shape: GeofenceShapeKind,
    /// Distance from the circle center or polygon centroid.
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckPointResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub inside: Vec<GeofenceMatch>,
}

/// Evaluates a coordinate against the evaluable geofences, sorted by name.
pub fn check_point(geofences: &[Geofence], point: GeoPoint) -> CheckPointResponse {
    let mut inside: Vec<GeofenceMatch> = geofences
        .iter()
        .filter(|g| g.is_evaluable() && g.contains(point))
        .map(|g| GeofenceMatch {
            id: g.id,
            name: g.name.clone(),
            shape: g.shape.kind(),
            distance_meters: haversine_distance_meters(point, g.shape.anchor()),
        })
        .collect();
    inside.sort_by(|a, b| a.name.cmp(&b.name));

    CheckPointResponse {
        latitude: point.latitude,
        longitude: point.longitude,
        inside,
    }
}
