//! Removes expired refresh-token sessions.

use persistence::repositories::SessionRepository;
use tracing::info;

use super::scheduler::{Job, JobError, JobFrequency};

pub struct SessionCleanupJob {
    sessions: SessionRepository,
}

impl SessionCleanupJob {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            sessions: SessionRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), JobError> {
        let deleted = self.sessions.delete_expired().await?;
        persistence::metrics::record_rows_purged("user_sessions", deleted);
        if deleted > 0 {
            info!(deleted, "Removed expired sessions");
        }
        Ok(())
    }
}
