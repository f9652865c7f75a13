//! Manual clock in/out, status and worked-time reports.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use domain::models::attendance::{
    default_range, summarize_by_day, AttendanceRangeQuery, AttendanceRecordsResponse,
    AttendanceStatusResponse, AttendanceSummaryResponse, ClockOut, ClockRequest, NewClockIn,
};
use domain::models::{AttendanceRecord, AttendanceSource};
use persistence::repositories::{AttendanceRepository, GpsPointRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// POST /api/v1/attendance/clock-in
///
/// Takes the same per-user lock as GPS ingestion so a manual clock-in cannot
/// race an automatic one.
pub async fn clock_in(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ClockRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    request.validate()?;

    let repo = AttendanceRepository::new(state.pool.clone());
    let mut tx = state.pool.begin().await?;
    GpsPointRepository::new(state.pool.clone())
        .lock_user(&mut *tx, auth.user_id)
        .await?;

    if repo
        .find_open_for_update(&mut *tx, auth.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Already clocked in".into()));
    }

    let record: AttendanceRecord = repo
        .clock_in(
            &mut *tx,
            &NewClockIn {
                user_id: auth.user_id,
                at: Utc::now(),
                source: AttendanceSource::Manual,
                geofence_id: None,
                latitude: request.latitude,
                longitude: request.longitude,
                note: request.note,
            },
        )
        .await?
        .into();
    tx.commit().await?;

    tracing::info!(user_id = %auth.user_id, record_id = %record.id, "Manual clock-in");
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/v1/attendance/clock-out
pub async fn clock_out(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ClockRequest>,
) -> Result<Json<AttendanceRecord>, ApiError> {
    request.validate()?;

    let mut tx = state.pool.begin().await?;
    GpsPointRepository::new(state.pool.clone())
        .lock_user(&mut *tx, auth.user_id)
        .await?;

    let record: AttendanceRecord = AttendanceRepository::new(state.pool.clone())
        .clock_out(
            &mut *tx,
            auth.user_id,
            &ClockOut {
                at: Utc::now(),
                source: AttendanceSource::Manual,
                latitude: request.latitude,
                longitude: request.longitude,
                note: request.note,
            },
        )
        .await?
        .ok_or_else(|| ApiError::Conflict("Not clocked in".into()))?
        .into();
    tx.commit().await?;

    tracing::info!(user_id = %auth.user_id, record_id = %record.id, "Manual clock-out");
    Ok(Json(record))
}

/// GET /api/v1/attendance/status
pub async fn status(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<AttendanceStatusResponse>, ApiError> {
    let open = AttendanceRepository::new(state.pool.clone())
        .find_open(auth.user_id)
        .await?
        .map(AttendanceRecord::from);

    Ok(Json(AttendanceStatusResponse::new(open, Utc::now())))
}

/// GET /api/v1/attendance/records
pub async fn records(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<AttendanceRangeQuery>,
) -> Result<Json<AttendanceRecordsResponse>, ApiError> {
    let user_id = auth.target_user(query.user_id)?;
    let (from, to) = resolve_range(&query, Utc::now())?;

    let records = load_records(&state, user_id, from, to).await?;
    Ok(Json(AttendanceRecordsResponse { records }))
}

/// GET /api/v1/attendance/summary
pub async fn summary(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<AttendanceRangeQuery>,
) -> Result<Json<AttendanceSummaryResponse>, ApiError> {
    let user_id = auth.target_user(query.user_id)?;
    let now = Utc::now();
    let (from, to) = resolve_range(&query, now)?;

    let records = load_records(&state, user_id, from, to).await?;
    let days = summarize_by_day(&records, from, to, now);
    let total_seconds = days.iter().map(|d| d.worked_seconds).sum();

    Ok(Json(AttendanceSummaryResponse {
        user_id,
        from,
        to,
        total_seconds,
        days,
    }))
}

async fn load_records(
    state: &AppState,
    user_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    Ok(AttendanceRepository::new(state.pool.clone())
        .list_in_range(user_id, from, to)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

/// Fills a missing bound from the default window and rejects empty ranges.
fn resolve_range(
    query: &AttendanceRangeQuery,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let (default_from, default_to) = default_range(now);
    let to = query.to.unwrap_or(default_to);
    let from = query
        .from
        .unwrap_or_else(|| default_from.min(to - (default_to - default_from)));

    if from >= to {
        return Err(ApiError::Validation("'from' must be before 'to'".into()));
    }
    Ok((from, to))
}
