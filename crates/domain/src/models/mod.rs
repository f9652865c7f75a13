//! Domain models for Worktrack.

pub mod attendance;
pub mod geo_event;
pub mod geofence;
pub mod gps_point;
pub mod notification;
pub mod organization_settings;
pub mod restriction;
pub mod session;
pub mod task;
pub mod time_entry;
pub mod user;

pub use attendance::{AttendanceRecord, AttendanceSource};
pub use geo_event::{GeoEvent, GeoEventAction, GeoEventType};
pub use geofence::{Geofence, GeofenceShape};
pub use gps_point::{GpsPoint, GpsPointInput, GpsSource};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use organization_settings::OrganizationSettings;
pub use session::UserSession;
pub use task::{Task, TaskStatus};
pub use time_entry::TimeEntry;
pub use user::{User, UserRole};

/// Deserializes a PATCH field so that `null` becomes `Some(None)` and an
/// absent field (with `#[serde(default)]`) stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}
