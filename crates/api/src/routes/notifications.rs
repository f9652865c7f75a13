//! Notification inbox.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use domain::models::notification::{
    ListNotificationsQuery, ListNotificationsResponse, MarkAllReadResponse, UnreadCountResponse,
};
use domain::models::Notification;
use persistence::repositories::NotificationRepository;
use shared::pagination::{decode_cursor, encode_cursor, page_limit};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::routes::take_page;

/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let limits = &state.config.limits;
    let limit = page_limit(query.limit, limits.default_page_size, limits.max_page_size);
    let before = query
        .cursor
        .as_deref()
        .map(decode_cursor::<Uuid>)
        .transpose()?;

    let rows = NotificationRepository::new(state.pool.clone())
        .list(auth.user_id, query.unread_only, before, limit + 1)
        .await?;

    let (rows, has_more) = take_page(rows, limit);
    let notifications: Vec<Notification> = rows.into_iter().map(Into::into).collect();
    let next_cursor = if has_more {
        notifications
            .last()
            .map(|n| encode_cursor(n.created_at, n.id))
    } else {
        None
    };

    Ok(Json(ListNotificationsResponse {
        notifications,
        next_cursor,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let unread = NotificationRepository::new(state.pool.clone())
        .unread_count(auth.user_id)
        .await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /api/v1/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = NotificationRepository::new(state.pool.clone())
        .mark_read(auth.user_id, notification_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".into()))?;
    Ok(Json(notification.into()))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = NotificationRepository::new(state.pool.clone())
        .mark_all_read(auth.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
