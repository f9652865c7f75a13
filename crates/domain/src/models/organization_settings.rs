//! Organization-wide settings (single row).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::services::restrictions::normalize_domain;

/// Organization settings controlling tracking, automation and restrictions.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSettings {
    pub gps_tracking_enabled: bool,
    /// Minimum seconds between accepted GPS points per user.
    pub gps_min_interval_secs: i32,
    /// Points reporting a worse accuracy are rejected.
    pub gps_max_accuracy_meters: f64,
    pub gps_retention_days: i32,
    pub auto_clock_enabled: bool,
    pub website_restrictions_enabled: bool,
    pub blocked_domains: Vec<String>,
    /// Informational workday window, `HH:MM`.
    pub workday_start: String,
    pub workday_end: String,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Uuid>,
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            gps_tracking_enabled: true,
            gps_min_interval_secs: 30,
            gps_max_accuracy_meters: 100.0,
            gps_retention_days: 90,
            auto_clock_enabled: true,
            website_restrictions_enabled: false,
            blocked_domains: Vec::new(),
            workday_start: "09:00".to_string(),
            workday_end: "17:00".to_string(),
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}

/// PUT request to update organization settings. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateOrganizationSettingsRequest {
    pub gps_tracking_enabled: Option<bool>,

    #[validate(range(min = 0, max = 3600, message = "gps_min_interval_secs must be 0-3600"))]
    pub gps_min_interval_secs: Option<i32>,

    #[validate(range(
        min = 1.0,
        max = 10000.0,
        message = "gps_max_accuracy_meters must be 1-10000"
    ))]
    pub gps_max_accuracy_meters: Option<f64>,

    #[validate(range(min = 1, max = 3650, message = "gps_retention_days must be 1-3650"))]
    pub gps_retention_days: Option<i32>,

    pub auto_clock_enabled: Option<bool>,

    pub website_restrictions_enabled: Option<bool>,

    #[validate(length(max = 500, message = "At most 500 blocked domains"))]
    #[validate(custom(function = "validate_domains"))]
    pub blocked_domains: Option<Vec<String>>,

    #[validate(custom(function = "shared::validation::validate_time_of_day"))]
    pub workday_start: Option<String>,

    #[validate(custom(function = "shared::validation::validate_time_of_day"))]
    pub workday_end: Option<String>,
}

fn validate_domains(domains: &[String]) -> Result<(), ValidationError> {
    if domains.iter().all(|d| normalize_domain(d).is_some()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("blocked_domains");
        err.message = Some("Each blocked domain must be a valid host name".into());
        Err(err)
    }
}

impl UpdateOrganizationSettingsRequest {
    /// Applies the present fields onto `current`. Domains are normalized and
    /// de-duplicated, keeping first-seen order.
    pub fn apply(self, mut current: OrganizationSettings) -> OrganizationSettings {
        if let Some(v) = self.gps_tracking_enabled {
            current.gps_tracking_enabled = v;
        }
        if let Some(v) = self.gps_min_interval_secs {
            current.gps_min_interval_secs = v;
        }
        if let Some(v) = self.gps_max_accuracy_meters {
            current.gps_max_accuracy_meters = v;
        }
        if let Some(v) = self.gps_retention_days {
            current.gps_retention_days = v;
        }
        if let Some(v) = self.auto_clock_enabled {
            current.auto_clock_enabled = v;
        }
        if let Some(v) = self.website_restrictions_enabled {
            current.website_restrictions_enabled = v;
        }
        if let Some(domains) = self.blocked_domains {
            let mut normalized: Vec<String> = Vec::with_capacity(domains.len());
            for domain in domains.iter().filter_map(|d| normalize_domain(d)) {
                if !normalized.contains(&domain) {
                    normalized.push(domain);
                }
            }
            current.blocked_domains = normalized;
        }
        if let Some(v) = self.workday_start {
            current.workday_start = v;
        }
        if let Some(v) = self.workday_end {
            current.workday_end = v;
        }
        current
    }
}
