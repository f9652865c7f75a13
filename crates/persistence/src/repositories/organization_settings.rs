//! Organization settings repository (single row).

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::OrganizationSettings;

use crate::entities::OrganizationSettingsEntity;
use crate::metrics::QueryTimer;

/// Repository for the organization_settings row.
#[derive(Clone)]
pub struct OrganizationSettingsRepository {
    pool: PgPool,
}

impl OrganizationSettingsRepository {
    /// Creates a new OrganizationSettingsRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The settings row. `None` only when the seed row is missing.
    pub async fn get(&self) -> Result<Option<OrganizationSettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_organization_settings");
        let result = sqlx::query_as::<_, OrganizationSettingsEntity>(
            r#"
            SELECT * FROM organization_settings WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Store the full settings, creating the row if needed.
    pub async fn save(
        &self,
        settings: &OrganizationSettings,
        updated_by: Uuid,
    ) -> Result<OrganizationSettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("save_organization_settings");
        let result = sqlx::query_as::<_, OrganizationSettingsEntity>(
            r#"
            INSERT INTO organization_settings (
                id, gps_tracking_enabled, gps_min_interval_secs, gps_max_accuracy_meters,
                gps_retention_days, auto_clock_enabled, website_restrictions_enabled,
                blocked_domains, workday_start, workday_end, updated_at, updated_by
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), $10)
            ON CONFLICT (id) DO UPDATE SET
                gps_tracking_enabled = EXCLUDED.gps_tracking_enabled,
                gps_min_interval_secs = EXCLUDED.gps_min_interval_secs,
                gps_max_accuracy_meters = EXCLUDED.gps_max_accuracy_meters,
                gps_retention_days = EXCLUDED.gps_retention_days,
                auto_clock_enabled = EXCLUDED.auto_clock_enabled,
                website_restrictions_enabled = EXCLUDED.website_restrictions_enabled,
                blocked_domains = EXCLUDED.blocked_domains,
                workday_start = EXCLUDED.workday_start,
                workday_end = EXCLUDED.workday_end,
                updated_at = NOW(),
                updated_by = EXCLUDED.updated_by
            RETURNING *
            "#,
        )
        .bind(settings.gps_tracking_enabled)
        .bind(settings.gps_min_interval_secs)
        .bind(settings.gps_max_accuracy_meters)
        .bind(settings.gps_retention_days)
        .bind(settings.auto_clock_enabled)
        .bind(settings.website_restrictions_enabled)
        .bind(&settings.blocked_domains)
        .bind(&settings.workday_start)
        .bind(&settings.workday_end)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
