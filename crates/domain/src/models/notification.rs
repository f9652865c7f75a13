//! In-app notification inbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::geo_event::GeoEventType;

/// What produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GeofenceEnter,
    GeofenceExit,
    AutoClockIn,
    AutoClockOut,
    TaskAssigned,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeofenceEnter => "geofence_enter",
            Self::GeofenceExit => "geofence_exit",
            Self::AutoClockIn => "auto_clock_in",
            Self::AutoClockOut => "auto_clock_out",
            Self::TaskAssigned => "task_assigned",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "geofence_enter" => Some(Self::GeofenceEnter),
            "geofence_exit" => Some(Self::GeofenceExit),
            "auto_clock_in" => Some(Self::AutoClockIn),
            "auto_clock_out" => Some(Self::AutoClockOut),
            "task_assigned" => Some(Self::TaskAssigned),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// A notification about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl NewNotification {
    /// Notification for a geofence crossing.
    pub fn geofence_crossing(
        user_id: Uuid,
        event_type: GeoEventType,
        geofence_id: Uuid,
        geofence_name: &str,
        event_id: Uuid,
    ) -> Self {
        let (kind, title, body) = match event_type {
            GeoEventType::Enter => (
                NotificationKind::GeofenceEnter,
                "Arrived",
                format!("You entered {}", geofence_name),
            ),
            GeoEventType::Exit => (
                NotificationKind::GeofenceExit,
                "Departed",
                format!("You left {}", geofence_name),
            ),
        };
        Self {
            user_id,
            kind,
            title: title.to_string(),
            body,
            data: json!({ "geofence_id": geofence_id, "geo_event_id": event_id }),
        }
    }

    /// Notification for an automatic clock-in.
    pub fn auto_clock_in(user_id: Uuid, geofence_name: &str, record_id: Uuid) -> Self {
        Self {
            user_id,
            kind: NotificationKind::AutoClockIn,
            title: "Clocked in".to_string(),
            body: format!("You were clocked in automatically at {}", geofence_name),
            data: json!({ "attendance_record_id": record_id }),
        }
    }

    /// Notification for an automatic clock-out.
    pub fn auto_clock_out(user_id: Uuid, geofence_name: &str, record_id: Uuid) -> Self {
        Self {
            user_id,
            kind: NotificationKind::AutoClockOut,
            title: "Clocked out".to_string(),
            body: format!("You were clocked out automatically after leaving {}", geofence_name),
            data: json!({ "attendance_record_id": record_id }),
        }
    }

    /// Notification for a task assignment.
    pub fn task_assigned(user_id: Uuid, task_id: Uuid, task_title: &str) -> Self {
        Self {
            user_id,
            kind: NotificationKind::TaskAssigned,
            title: "New task".to_string(),
            body: format!("You were assigned: {}", task_title),
            data: json!({ "task_id": task_id }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListNotificationsResponse {
    pub notifications: Vec<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}
