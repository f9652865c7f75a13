//! GPS point retention.
//!
//! Deletes points captured more than `gps_retention_days` ago, in batches
//! so a large backlog never holds locks for long.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use domain::models::OrganizationSettings;
use persistence::repositories::{GpsPointRepository, OrganizationSettingsRepository};

use super::scheduler::{Job, JobError, JobFrequency};

pub struct GpsRetentionJob {
    points: GpsPointRepository,
    settings: OrganizationSettingsRepository,
    interval_secs: u64,
    batch_size: i64,
}

impl GpsRetentionJob {
    pub fn new(pool: PgPool, interval_secs: u64, batch_size: i64) -> Self {
        Self {
            points: GpsPointRepository::new(pool.clone()),
            settings: OrganizationSettingsRepository::new(pool),
            interval_secs,
            batch_size: batch_size.max(1),
        }
    }

    /// Deletes everything older than `cutoff`. Returns the number of rows.
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut total: u64 = 0;
        loop {
            let deleted = self
                .points
                .delete_batch_older_than(cutoff, self.batch_size)
                .await?;
            total += deleted;

            if deleted < self.batch_size as u64 {
                break;
            }
            tokio::task::yield_now().await;
        }
        Ok(total)
    }
}

/// Oldest capture time that is kept.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i32) -> DateTime<Utc> {
    now - Duration::days(i64::from(retention_days.max(1)))
}

#[async_trait::async_trait]
impl Job for GpsRetentionJob {
    fn name(&self) -> &'static str {
        "gps_retention"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), JobError> {
        let settings: OrganizationSettings = self
            .settings
            .get()
            .await?
            .map(Into::into)
            .unwrap_or_default();

        let cutoff = retention_cutoff(Utc::now(), settings.gps_retention_days);
        let deleted = self.purge_before(cutoff).await?;
        persistence::metrics::record_rows_purged("gps_points", deleted);

        info!(
            deleted,
            retention_days = settings.gps_retention_days,
            cutoff = %cutoff,
            "GPS retention pass finished"
        );
        Ok(())
    }
}
