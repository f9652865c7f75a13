//! GPS upload, history and fleet view.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use domain::models::gps_point::{
    GpsHistoryQuery, GpsHistoryResponse, GpsPointResponse, GpsUpload, IngestGpsPointsRequest,
    IngestGpsPointsResponse, LatestPosition, LatestPositionsResponse,
};
use domain::models::{GpsPoint, UserRole};
use persistence::repositories::{GpsHistoryParams, GpsPointRepository};
use shared::pagination::{decode_cursor, encode_cursor, page_limit};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::routes::{check_range, take_page};
use crate::services::GpsIngestionService;

/// POST /api/v1/gps/points
///
/// Accepts `{"points": [...]}` or a single point object.
pub async fn ingest_points(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(upload): Json<GpsUpload>,
) -> Result<(StatusCode, Json<IngestGpsPointsResponse>), ApiError> {
    let request = IngestGpsPointsRequest::from(upload);
    request.validate()?;

    let max = state.config.limits.max_gps_batch_size;
    if request.points.len() > max {
        return Err(ApiError::Validation(format!(
            "Batch must contain at most {} points",
            max
        )));
    }

    let response = GpsIngestionService::new(state.pool.clone())
        .ingest(auth.user_id, &request.points)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/gps/points
pub async fn history(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<GpsHistoryQuery>,
) -> Result<Json<GpsHistoryResponse>, ApiError> {
    let user_id = auth.target_user(query.user_id)?;
    check_range(query.from, query.to)?;

    let limits = &state.config.limits;
    let limit = page_limit(query.limit, limits.default_page_size, limits.max_page_size);
    let after = query
        .cursor
        .as_deref()
        .map(decode_cursor::<i64>)
        .transpose()?;

    let rows = GpsPointRepository::new(state.pool.clone())
        .history(&GpsHistoryParams {
            user_id,
            from: query.from,
            to: query.to,
            after,
            limit: limit + 1,
            order: query.order,
        })
        .await?;

    let (rows, has_more) = take_page(rows, limit);
    let points: Vec<GpsPoint> = rows.into_iter().map(Into::into).collect();
    let next_cursor = if has_more {
        points.last().map(|p| encode_cursor(p.captured_at, p.id))
    } else {
        None
    };

    Ok(Json(GpsHistoryResponse {
        user_id,
        points: points.into_iter().map(GpsPointResponse::from).collect(),
        next_cursor,
    }))
}

/// GET /api/v1/gps/latest
pub async fn latest_positions(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<LatestPositionsResponse>, ApiError> {
    auth.require_role(UserRole::Manager)?;

    let positions: Vec<LatestPosition> = GpsPointRepository::new(state.pool.clone())
        .latest_per_user()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(LatestPositionsResponse { positions }))
}
