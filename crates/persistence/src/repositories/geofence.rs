//! Geofence repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{GeofenceEntity, ShapeColumns};
use crate::metrics::QueryTimer;

/// Non-geometry geofence columns.
#[derive(Debug, Clone)]
pub struct GeofenceFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub auto_clock_in: bool,
    pub auto_clock_out: bool,
    pub active: bool,
}

/// Repository for geofence-related database operations.
#[derive(Clone)]
pub struct GeofenceRepository {
    pool: PgPool,
}

impl GeofenceRepository {
    /// Creates a new GeofenceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new geofence.
    pub async fn create(
        &self,
        fields: &GeofenceFields<'_>,
        shape: &ShapeColumns,
        created_by: Uuid,
    ) -> Result<GeofenceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_geofence");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            INSERT INTO geofences (name, description, shape, center_latitude, center_longitude,
                                   radius_meters, vertices, auto_clock_in, auto_clock_out,
                                   active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(fields.name)
        .bind(fields.description)
        .bind(shape.shape)
        .bind(shape.center_latitude)
        .bind(shape.center_longitude)
        .bind(shape.radius_meters)
        .bind(&shape.vertices)
        .bind(fields.auto_clock_in)
        .bind(fields.auto_clock_out)
        .bind(fields.active)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a geofence by ID.
    pub async fn find_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<GeofenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_geofence_by_id");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            SELECT * FROM geofences WHERE id = $1 AND ($2 OR deleted_at IS NULL)
            "#,
        )
        .bind(id)
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List geofences ordered by name.
    pub async fn list(
        &self,
        active: Option<bool>,
        include_deleted: bool,
    ) -> Result<Vec<GeofenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_geofences");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            SELECT * FROM geofences
            WHERE ($1::BOOLEAN IS NULL OR active = $1)
              AND ($2 OR deleted_at IS NULL)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(active)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active, non-deleted geofences read inside an ingestion transaction.
    pub async fn list_evaluable(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<GeofenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_evaluable_geofences");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            SELECT * FROM geofences
            WHERE active = true AND deleted_at IS NULL
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Count non-deleted geofences, active or not. Deactivated geofences
    /// still count toward the creation limit since they can be reactivated.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_geofences");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM geofences WHERE deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Overwrite a geofence's fields and geometry.
    pub async fn update(
        &self,
        id: Uuid,
        fields: &GeofenceFields<'_>,
        shape: &ShapeColumns,
    ) -> Result<Option<GeofenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_geofence");
        let result = sqlx::query_as::<_, GeofenceEntity>(
            r#"
            UPDATE geofences SET
                name = $2,
                description = $3,
                shape = $4,
                center_latitude = $5,
                center_longitude = $6,
                radius_meters = $7,
                vertices = $8,
                auto_clock_in = $9,
                auto_clock_out = $10,
                active = $11,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.description)
        .bind(shape.shape)
        .bind(shape.center_latitude)
        .bind(shape.center_longitude)
        .bind(shape.radius_meters)
        .bind(&shape.vertices)
        .bind(fields.auto_clock_in)
        .bind(fields.auto_clock_out)
        .bind(fields.active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft delete a geofence.
    /// Returns the number of rows affected (0 or 1).
    pub async fn soft_delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_geofence");
        let result = sqlx::query(
            r#"
            UPDATE geofences SET deleted_at = NOW(), active = false, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
