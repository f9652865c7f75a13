//! HTTP route handlers.

use chrono::{DateTime, Utc};

use crate::error::ApiError;

pub mod attendance;
pub mod auth;
pub mod geo_events;
pub mod geofences;
pub mod gps;
pub mod health;
pub mod notifications;
pub mod organization;
pub mod restrictions;
pub mod tasks;
pub mod timer;
pub mod users;

/// Splits the extra row fetched by a `limit + 1` query off a page.
pub(crate) fn take_page<T>(mut rows: Vec<T>, limit: i64) -> (Vec<T>, bool) {
    let limit = usize::try_from(limit).unwrap_or(0);
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    (rows, has_more)
}

/// Rejects a time range whose start is after its end.
pub(crate) fn check_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => {
            Err(ApiError::Validation("'from' must not be after 'to'".into()))
        }
        _ => Ok(()),
    }
}
