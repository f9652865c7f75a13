//! GPS point repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use domain::models::gps_point::SortOrder;
use domain::models::GpsPointInput;

use crate::entities::{GpsPointEntity, LatestPositionEntity};
use crate::metrics::QueryTimer;

/// Parameters for a keyset-paginated history query.
#[derive(Debug, Clone)]
pub struct GpsHistoryParams {
    pub user_id: Uuid,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// `(captured_at, id)` of the last row of the previous page.
    pub after: Option<(DateTime<Utc>, i64)>,
    pub limit: i64,
    pub order: SortOrder,
}

/// Repository for gps_points.
#[derive(Clone)]
pub struct GpsPointRepository {
    pool: PgPool,
}

impl GpsPointRepository {
    /// Creates a new GpsPointRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serializes ingestion for one user until the transaction ends.
    pub async fn lock_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("lock_gps_user");
        let result = sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT, 0))")
            .bind(user_id)
            .execute(&mut *conn)
            .await;
        timer.record();
        result.map(|_| ())
    }

    /// Capture time of the user's newest stored point.
    pub async fn latest_captured_at(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let timer = QueryTimer::new("find_latest_gps_point");
        let result: Result<Option<(DateTime<Utc>,)>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT captured_at FROM gps_points
            WHERE user_id = $1
            ORDER BY captured_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result.map(|row| row.map(|r| r.0))
    }

    /// Insert one accepted point.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        point: &GpsPointInput,
    ) -> Result<GpsPointEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_gps_point");
        let result = sqlx::query_as::<_, GpsPointEntity>(
            r#"
            INSERT INTO gps_points (
                user_id, latitude, longitude, accuracy, altitude, speed, heading,
                source, battery_level, captured_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(point.accuracy)
        .bind(point.altitude)
        .bind(point.speed)
        .bind(point.heading)
        .bind(point.source.as_str())
        .bind(point.battery_level)
        .bind(point.captured_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// One page of a user's history. Fetches `limit` rows; callers ask for
    /// one extra to detect a next page.
    pub async fn history(&self, params: &GpsHistoryParams) -> Result<Vec<GpsPointEntity>, sqlx::Error> {
        let timer = QueryTimer::new("gps_point_history");
        let direction = params.order.as_sql();
        let comparison = match params.order {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        };
        let sql = format!(
            r#"
            SELECT * FROM gps_points
            WHERE user_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR captured_at >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR captured_at <= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR (captured_at, id) {comparison} ($4, $5))
            ORDER BY captured_at {direction}, id {direction}
            LIMIT $6
            "#
        );
        let (after_at, after_id) = match params.after {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let result = sqlx::query_as::<_, GpsPointEntity>(&sql)
            .bind(params.user_id)
            .bind(params.from)
            .bind(params.to)
            .bind(after_at)
            .bind(after_id)
            .bind(params.limit)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Newest point of every active user.
    pub async fn latest_per_user(&self) -> Result<Vec<LatestPositionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("latest_gps_per_user");
        let result = sqlx::query_as::<_, LatestPositionEntity>(
            r#"
            SELECT DISTINCT ON (p.user_id)
                p.user_id, u.display_name, p.latitude, p.longitude, p.accuracy,
                p.battery_level, p.captured_at
            FROM gps_points p
            JOIN users u ON u.id = p.user_id
            WHERE u.is_active = true AND u.deleted_at IS NULL
            ORDER BY p.user_id, p.captured_at DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete up to `batch_size` points captured before `cutoff`.
    pub async fn delete_batch_older_than(
        &self,
        cutoff: DateTime<Utc>,
        batch_size: i64,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_old_gps_points");
        let result = sqlx::query(
            r#"
            WITH to_delete AS (
                SELECT id FROM gps_points
                WHERE captured_at < $1
                LIMIT $2
            )
            DELETE FROM gps_points
            WHERE id IN (SELECT id FROM to_delete)
            "#,
        )
        .bind(cutoff)
        .bind(batch_size)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
