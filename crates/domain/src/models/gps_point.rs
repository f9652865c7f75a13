//! GPS point domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::geo_event::GeoEventResponse;
use crate::services::geometry::GeoPoint;

/// Largest batch a single upload may carry.
pub const MAX_BATCH_SIZE: usize = 100;

/// How the device obtained the fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpsSource {
    #[default]
    Gps,
    Network,
    Wifi,
    Manual,
}

impl GpsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Network => "network",
            Self::Wifi => "wifi",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gps" => Some(Self::Gps),
            "network" => Some(Self::Network),
            "wifi" => Some(Self::Wifi),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// A stored GPS sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsPoint {
    pub id: i64,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub source: GpsSource,
    pub battery_level: Option<i32>,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One sample in an upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GpsPointInput {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    pub altitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_heading"))]
    pub heading: Option<f64>,

    #[serde(default)]
    pub source: GpsSource,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,

    #[validate(custom(function = "shared::validation::validate_captured_at"))]
    pub captured_at: DateTime<Utc>,
}

impl GpsPointInput {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Request payload for `POST /gps/points`.
///
/// Accepts either `{"points": [...]}` or a single bare point, which is
/// treated as a batch of one.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestGpsPointsRequest {
    #[validate(length(min = 1, max = 100, message = "Batch must contain 1-100 points"))]
    #[validate(nested)]
    pub points: Vec<GpsPointInput>,
}

/// Wire shape accepted by the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GpsUpload {
    Batch(IngestGpsPointsRequest),
    Single(GpsPointInput),
}

impl From<GpsUpload> for IngestGpsPointsRequest {
    fn from(upload: GpsUpload) -> Self {
        match upload {
            GpsUpload::Batch(batch) => batch,
            GpsUpload::Single(point) => Self {
                points: vec![point],
            },
        }
    }
}

/// Why a submitted point was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    LowAccuracy,
    TooFrequent,
    OutOfOrder,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowAccuracy => "low_accuracy",
            Self::TooFrequent => "too_frequent",
            Self::OutOfOrder => "out_of_order",
        }
    }
}

/// A rejected point, by its index in the submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRejection {
    pub index: usize,
    pub reason: RejectionReason,
}

/// Response payload for an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestGpsPointsResponse {
    pub accepted: usize,
    pub rejected: usize,
    pub rejections: Vec<PointRejection>,
    pub events: Vec<GeoEventResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceChange>,
}

/// Net attendance change caused by an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceChange {
    ClockedIn,
    ClockedOut,
}

/// Sort order for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query parameters for `GET /gps/points`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GpsHistoryQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsPointResponse {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    pub source: GpsSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub captured_at: DateTime<Utc>,
}

impl From<GpsPoint> for GpsPointResponse {
    fn from(p: GpsPoint) -> Self {
        Self {
            id: p.id,
            latitude: p.latitude,
            longitude: p.longitude,
            accuracy: p.accuracy,
            altitude: p.altitude,
            speed: p.speed,
            heading: p.heading,
            source: p.source,
            battery_level: p.battery_level,
            captured_at: p.captured_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GpsHistoryResponse {
    pub user_id: Uuid,
    pub points: Vec<GpsPointResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Latest known position of a user, for the fleet view.
#[derive(Debug, Clone, Serialize)]
pub struct LatestPosition {
    pub user_id: Uuid,
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestPositionsResponse {
    pub positions: Vec<LatestPosition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_json(captured_at: &str) -> String {
        format!(
            r#"{{"latitude": 48.1, "longitude": 17.1, "accuracy": 12.5, "captured_at": "{captured_at}"}}"#
        )
    }

    #[test]
    fn test_single_point_becomes_batch_of_one() {
        let now = Utc::now().to_rfc3339();
        let upload: GpsUpload = serde_json::from_str(&point_json(&now)).unwrap();
        let request = IngestGpsPointsRequest::from(upload);
        assert_eq!(request.points.len(), 1);
        assert_eq!(request.points[0].source, GpsSource::Gps);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_batch_upload() {
        let now = Utc::now().to_rfc3339();
        let json = format!(r#"{{"points": [{}, {}]}}"#, point_json(&now), point_json(&now));
        let upload: GpsUpload = serde_json::from_str(&json).unwrap();
        assert!(matches!(upload, GpsUpload::Batch(_)));
        assert_eq!(IngestGpsPointsRequest::from(upload).points.len(), 2);
    }

    #[test]
    fn test_empty_batch_invalid() {
        let request = IngestGpsPointsRequest { points: vec![] };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_oversized_batch_invalid() {
        let now = Utc::now().to_rfc3339();
        let point: GpsPointInput = serde_json::from_str(&point_json(&now)).unwrap();
        let request = IngestGpsPointsRequest {
            points: vec![point; MAX_BATCH_SIZE + 1],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_nested_point_validation() {
        let now = Utc::now().to_rfc3339();
        let mut point: GpsPointInput = serde_json::from_str(&point_json(&now)).unwrap();
        point.heading = Some(400.0);
        let request = IngestGpsPointsRequest {
            points: vec![point],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_stale_point_invalid() {
        let old = (Utc::now() - chrono::Duration::days(10)).to_rfc3339();
        let point: GpsPointInput = serde_json::from_str(&point_json(&old)).unwrap();
        assert!(point.validate().is_err());
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(GpsSource::parse("wifi"), Some(GpsSource::Wifi));
        assert_eq!(GpsSource::parse("satellite"), None);
        let json = r#""network""#;
        assert_eq!(serde_json::from_str::<GpsSource>(json).unwrap(), GpsSource::Network);
    }

    #[test]
    fn test_rejection_serialization() {
        let rejection = PointRejection {
            index: 3,
            reason: RejectionReason::TooFrequent,
        };
        let json = serde_json::to_value(rejection).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["reason"], "too_frequent");
        assert_eq!(RejectionReason::LowAccuracy.as_str(), "low_accuracy");
    }

    #[test]
    fn test_history_query_default_order() {
        let query: GpsHistoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
    }
}
