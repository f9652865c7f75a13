//! Geo-event domain models and DTOs.
//!
//! A geo-event is one recorded enter/exit crossing of a geofence by a user,
//! derived from an accepted GPS point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a geofence crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoEventType {
    Enter,
    Exit,
}

impl GeoEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "enter" => Some(Self::Enter),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

impl std::fmt::Display for GeoEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attendance action a geo-event triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoEventAction {
    #[default]
    None,
    ClockIn,
    ClockOut,
}

impl GeoEventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClockIn => "clock_in",
            Self::ClockOut => "clock_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "clock_in" => Some(Self::ClockIn),
            "clock_out" => Some(Self::ClockOut),
            _ => None,
        }
    }
}

/// Domain model for a geo-event.
#[derive(Debug, Clone)]
pub struct GeoEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub geofence_id: Uuid,
    pub geofence_name: Option<String>,
    pub event_type: GeoEventType,
    pub latitude: f64,
    pub longitude: f64,
    pub gps_point_id: Option<i64>,
    pub action: GeoEventAction,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Values for inserting a geo-event.
#[derive(Debug, Clone)]
pub struct NewGeoEvent {
    pub user_id: Uuid,
    pub geofence_id: Uuid,
    pub event_type: GeoEventType,
    pub latitude: f64,
    pub longitude: f64,
    pub gps_point_id: Option<i64>,
    pub action: GeoEventAction,
    pub occurred_at: DateTime<Utc>,
}

/// Response payload for a geo-event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoEventResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub geofence_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence_name: Option<String>,
    pub event_type: GeoEventType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_point_id: Option<i64>,
    pub action: GeoEventAction,
    pub occurred_at: DateTime<Utc>,
}

impl From<GeoEvent> for GeoEventResponse {
    fn from(e: GeoEvent) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            geofence_id: e.geofence_id,
            geofence_name: e.geofence_name,
            event_type: e.event_type,
            latitude: e.latitude,
            longitude: e.longitude,
            gps_point_id: e.gps_point_id,
            action: e.action,
            occurred_at: e.occurred_at,
        }
    }
}

/// Query parameters for listing geo-events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGeoEventsQuery {
    pub user_id: Option<Uuid>,
    pub geofence_id: Option<Uuid>,
    pub event_type: Option<GeoEventType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListGeoEventsResponse {
    pub events: Vec<GeoEventResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
