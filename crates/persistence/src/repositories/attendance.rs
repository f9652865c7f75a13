//! Attendance record repository.
//!
//! Clock-in and clock-out take a connection so automatic changes can share
//! the GPS ingestion transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use domain::models::attendance::{ClockOut, NewClockIn};

use crate::entities::AttendanceEntity;
use crate::metrics::QueryTimer;

/// Repository for attendance_records.
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    /// Creates a new AttendanceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The user's open record, if any.
    pub async fn find_open(&self, user_id: Uuid) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_open_attendance");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE user_id = $1 AND clock_out_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Like [`find_open`](Self::find_open) but locks the row until commit.
    pub async fn find_open_for_update(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_open_attendance_for_update");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE user_id = $1 AND clock_out_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// End of the user's most recently closed record.
    pub async fn latest_clock_out(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let timer = QueryTimer::new("latest_clock_out");
        let result = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            r#"
            SELECT MAX(clock_out_at) FROM attendance_records WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Open a record. A second open record violates the partial unique index.
    pub async fn clock_in(
        &self,
        conn: &mut PgConnection,
        clock_in: &NewClockIn,
    ) -> Result<AttendanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("clock_in");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            INSERT INTO attendance_records (
                user_id, clock_in_at, clock_in_source, geofence_id,
                clock_in_latitude, clock_in_longitude, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(clock_in.user_id)
        .bind(clock_in.at)
        .bind(clock_in.source.as_str())
        .bind(clock_in.geofence_id)
        .bind(clock_in.latitude)
        .bind(clock_in.longitude)
        .bind(clock_in.note.as_deref())
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Close the user's open record. Returns `None` when nothing is open.
    pub async fn clock_out(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        clock_out: &ClockOut,
    ) -> Result<Option<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("clock_out");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            UPDATE attendance_records SET
                clock_out_at = GREATEST($2, clock_in_at),
                clock_out_source = $3,
                clock_out_latitude = $4,
                clock_out_longitude = $5,
                note = COALESCE($6, note),
                updated_at = NOW()
            WHERE user_id = $1 AND clock_out_at IS NULL
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(clock_out.at)
        .bind(clock_out.source.as_str())
        .bind(clock_out.latitude)
        .bind(clock_out.longitude)
        .bind(clock_out.note.as_deref())
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Records overlapping `[from, to)`, oldest first. Open records count as
    /// running until now.
    pub async fn list_in_range(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AttendanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_attendance_in_range");
        let result = sqlx::query_as::<_, AttendanceEntity>(
            r#"
            SELECT * FROM attendance_records
            WHERE user_id = $1
              AND clock_in_at < $3
              AND (clock_out_at IS NULL OR clock_out_at > $2)
            ORDER BY clock_in_at ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
