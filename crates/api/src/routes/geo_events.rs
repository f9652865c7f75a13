//! Geo-event listing.

use axum::{
    extract::{Query, State},
    Json,
};
use uuid::Uuid;

use domain::models::geo_event::{GeoEventResponse, ListGeoEventsQuery, ListGeoEventsResponse};
use domain::models::GeoEvent;
use persistence::repositories::{GeoEventFilter, GeoEventRepository};
use shared::pagination::{decode_cursor, encode_cursor, page_limit};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::routes::{check_range, take_page};

/// GET /api/v1/gps/events
///
/// Newest first. Employees see only their own events.
pub async fn list_geo_events(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListGeoEventsQuery>,
) -> Result<Json<ListGeoEventsResponse>, ApiError> {
    let user_id = auth.target_user(query.user_id)?;
    check_range(query.from, query.to)?;

    let limits = &state.config.limits;
    let limit = page_limit(query.limit, limits.default_page_size, limits.max_page_size);
    let before = query
        .cursor
        .as_deref()
        .map(decode_cursor::<Uuid>)
        .transpose()?;

    let filter = GeoEventFilter {
        user_id: Some(user_id),
        geofence_id: query.geofence_id,
        event_type: query.event_type,
        from: query.from,
        to: query.to,
        before,
    };
    let rows = GeoEventRepository::new(state.pool.clone())
        .list(&filter, limit + 1)
        .await?;

    let (rows, has_more) = take_page(rows, limit);
    let events: Vec<GeoEvent> = rows.into_iter().map(Into::into).collect();
    let next_cursor = if has_more {
        events.last().map(|e| encode_cursor(e.occurred_at, e.id))
    } else {
        None
    };

    Ok(Json(ListGeoEventsResponse {
        events: events.into_iter().map(GeoEventResponse::from).collect(),
        next_cursor,
    }))
}
