//! Per-user geofence membership state.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::entities::GeofenceStateEntity;
use crate::metrics::QueryTimer;

/// Repository for geofence_states. Only used inside ingestion transactions.
#[derive(Clone, Default)]
pub struct GeofenceStateRepository;

impl GeofenceStateRepository {
    pub fn new() -> Self {
        Self
    }

    /// All recorded memberships of a user.
    pub async fn find_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<GeofenceStateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_geofence_states");
        let result = sqlx::query_as::<_, GeofenceStateEntity>(
            r#"
            SELECT * FROM geofence_states WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert or replace the memberships of one user in a single statement.
    pub async fn upsert_all(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        states: &[(Uuid, bool)],
        last_point_id: i64,
    ) -> Result<(), sqlx::Error> {
        if states.is_empty() {
            return Ok(());
        }
        let (geofence_ids, inside): (Vec<Uuid>, Vec<bool>) = states.iter().copied().unzip();

        let timer = QueryTimer::new("upsert_geofence_states");
        let result = sqlx::query(
            r#"
            INSERT INTO geofence_states (user_id, geofence_id, inside, last_point_id, updated_at)
            SELECT $1, s.geofence_id, s.inside, $4, NOW()
            FROM UNNEST($2::uuid[], $3::bool[]) AS s(geofence_id, inside)
            ON CONFLICT (user_id, geofence_id) DO UPDATE SET
                inside = EXCLUDED.inside,
                last_point_id = EXCLUDED.last_point_id,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(&geofence_ids)
        .bind(&inside)
        .bind(last_point_id)
        .execute(&mut *conn)
        .await;
        timer.record();
        result.map(|_| ())
    }
}
