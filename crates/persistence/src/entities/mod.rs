//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod attendance;
pub mod geo_event;
pub mod geofence;
pub mod gps_point;
pub mod notification;
pub mod organization_settings;
pub mod task;
pub mod time_entry;
pub mod user;

pub use attendance::AttendanceEntity;
pub use geo_event::GeoEventEntity;
pub use geofence::{GeofenceEntity, GeofenceStateEntity, ShapeColumns};
pub use gps_point::{GpsPointEntity, LatestPositionEntity};
pub use notification::NotificationEntity;
pub use organization_settings::OrganizationSettingsEntity;
pub use task::TaskEntity;
pub use time_entry::TimeEntryEntity;
pub use user::{UserEntity, UserSessionEntity};
