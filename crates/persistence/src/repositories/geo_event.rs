//! Geo-event repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use domain::models::{geo_event::NewGeoEvent, GeoEventType};

use crate::entities::GeoEventEntity;
use crate::metrics::QueryTimer;

/// Filters for listing geo-events.
#[derive(Debug, Clone, Default)]
pub struct GeoEventFilter {
    pub user_id: Option<Uuid>,
    pub geofence_id: Option<Uuid>,
    pub event_type: Option<GeoEventType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// `(occurred_at, id)` of the last row of the previous page.
    pub before: Option<(DateTime<Utc>, Uuid)>,
}

/// Repository for geo_events.
#[derive(Clone)]
pub struct GeoEventRepository {
    pool: PgPool,
}

impl GeoEventRepository {
    /// Creates a new GeoEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a crossing.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        event: &NewGeoEvent,
    ) -> Result<GeoEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_geo_event");
        let result = sqlx::query_as::<_, GeoEventEntity>(
            r#"
            INSERT INTO geo_events (user_id, geofence_id, event_type, latitude, longitude,
                                    gps_point_id, action, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(event.user_id)
        .bind(event.geofence_id)
        .bind(event.event_type.as_str())
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.gps_point_id)
        .bind(event.action.as_str())
        .bind(event.occurred_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Newest events first, with the geofence name joined in.
    pub async fn list(
        &self,
        filter: &GeoEventFilter,
        limit: i64,
    ) -> Result<Vec<GeoEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_geo_events");
        let (before_at, before_id) = match filter.before {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let result = sqlx::query_as::<_, GeoEventEntity>(
            r#"
            SELECT e.*, g.name AS geofence_name
            FROM geo_events e
            LEFT JOIN geofences g ON g.id = e.geofence_id
            WHERE ($1::UUID IS NULL OR e.user_id = $1)
              AND ($2::UUID IS NULL OR e.geofence_id = $2)
              AND ($3::TEXT IS NULL OR e.event_type = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR e.occurred_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR e.occurred_at <= $5)
              AND ($6::TIMESTAMPTZ IS NULL OR (e.occurred_at, e.id) < ($6, $7))
            ORDER BY e.occurred_at DESC, e.id DESC
            LIMIT $8
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.geofence_id)
        .bind(filter.event_type.map(|t| t.as_str()))
        .bind(filter.from)
        .bind(filter.to)
        .bind(before_at)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
