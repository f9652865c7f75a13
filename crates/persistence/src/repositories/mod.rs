//! Repository implementations for database operations.

pub mod attendance;
pub mod geo_event;
pub mod geofence;
pub mod geofence_state;
pub mod gps_point;
pub mod notification;
pub mod organization_settings;
pub mod session;
pub mod task;
pub mod time_entry;
pub mod user;

pub use attendance::AttendanceRepository;
pub use geo_event::{GeoEventFilter, GeoEventRepository};
pub use geofence::{GeofenceFields, GeofenceRepository};
pub use geofence_state::GeofenceStateRepository;
pub use gps_point::{GpsHistoryParams, GpsPointRepository};
pub use notification::NotificationRepository;
pub use organization_settings::OrganizationSettingsRepository;
pub use session::SessionRepository;
pub use task::{TaskChanges, TaskFilter, TaskRepository};
pub use time_entry::TimeEntryRepository;
pub use user::{UserFilter, UserRepository};
