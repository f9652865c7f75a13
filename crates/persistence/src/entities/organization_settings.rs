//! Organization settings entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::OrganizationSettings;

/// Database row mapping for the single organization_settings row.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationSettingsEntity {
    pub id: i16,
    pub gps_tracking_enabled: bool,
    pub gps_min_interval_secs: i32,
    pub gps_max_accuracy_meters: f64,
    pub gps_retention_days: i32,
    pub auto_clock_enabled: bool,
    pub website_restrictions_enabled: bool,
    pub blocked_domains: Vec<String>,
    pub workday_start: String,
    pub workday_end: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl From<OrganizationSettingsEntity> for OrganizationSettings {
    fn from(entity: OrganizationSettingsEntity) -> Self {
        Self {
            gps_tracking_enabled: entity.gps_tracking_enabled,
            gps_min_interval_secs: entity.gps_min_interval_secs,
            gps_max_accuracy_meters: entity.gps_max_accuracy_meters,
            gps_retention_days: entity.gps_retention_days,
            auto_clock_enabled: entity.auto_clock_enabled,
            website_restrictions_enabled: entity.website_restrictions_enabled,
            blocked_domains: entity.blocked_domains,
            workday_start: entity.workday_start,
            workday_end: entity.workday_end,
            updated_at: entity.updated_at,
            updated_by: entity.updated_by,
        }
    }
}
