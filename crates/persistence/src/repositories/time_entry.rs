//! Time entry (task timer) repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TimeEntryEntity;
use crate::metrics::QueryTimer;

/// Repository for time_entries.
#[derive(Clone)]
pub struct TimeEntryRepository {
    pool: PgPool,
}

impl TimeEntryRepository {
    /// Creates a new TimeEntryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a timer. A second running entry violates the partial unique
    /// index and surfaces as a unique violation.
    pub async fn start(
        &self,
        user_id: Uuid,
        task_id: Option<Uuid>,
        note: Option<&str>,
    ) -> Result<TimeEntryEntity, sqlx::Error> {
        let timer = QueryTimer::new("start_time_entry");
        let result = sqlx::query_as::<_, TimeEntryEntity>(
            r#"
            INSERT INTO time_entries (user_id, task_id, note)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(note)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The user's running entry, if any.
    pub async fn find_running(&self, user_id: Uuid) -> Result<Option<TimeEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_running_time_entry");
        let result = sqlx::query_as::<_, TimeEntryEntity>(
            r#"
            SELECT * FROM time_entries WHERE user_id = $1 AND stopped_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stop the running entry and store its duration. A note, when given,
    /// replaces the one set at start.
    pub async fn stop_running(
        &self,
        user_id: Uuid,
        note: Option<&str>,
    ) -> Result<Option<TimeEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("stop_time_entry");
        let result = sqlx::query_as::<_, TimeEntryEntity>(
            r#"
            UPDATE time_entries SET
                stopped_at = NOW(),
                duration_secs = GREATEST(0, EXTRACT(EPOCH FROM (NOW() - started_at)))::BIGINT,
                note = COALESCE($2, note)
            WHERE user_id = $1 AND stopped_at IS NULL
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(note)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List a user's entries started within `[from, to)`, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        task_id: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<TimeEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_time_entries");
        let result = sqlx::query_as::<_, TimeEntryEntity>(
            r#"
            SELECT * FROM time_entries
            WHERE user_id = $1
              AND ($2::UUID IS NULL OR task_id = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR started_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR started_at < $4)
            ORDER BY started_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
