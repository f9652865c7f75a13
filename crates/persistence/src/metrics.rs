//! Database metrics.
//!
//! Every repository method wraps its query in a [`QueryTimer`]; the pool
//! job calls [`record_pool_metrics`] once a minute.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a named query took.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record connection pool usage.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Count rows removed by a cleanup query.
pub fn record_rows_purged(table: &'static str, rows: u64) {
    counter!("database_rows_purged_total", "table" => table).increment(rows);
}

/// Times one database operation.
///
/// ```ignore
/// let timer = QueryTimer::new("find_latest_gps_point");
/// let result = sqlx::query_as::<_, GpsPointEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
