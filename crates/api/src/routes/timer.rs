//! Task timer.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use domain::models::time_entry::{
    CurrentTimerResponse, ListTimeEntriesQuery, ListTimeEntriesResponse, StartTimerRequest,
    StopTimerRequest,
};
use domain::models::{Task, TimeEntry, UserRole};
use persistence::repositories::{TaskRepository, TimeEntryRepository};
use shared::pagination::page_limit;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::routes::check_range;

/// POST /api/v1/timer/start
pub async fn start_timer(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<StartTimerRequest>,
) -> Result<(StatusCode, Json<TimeEntry>), ApiError> {
    request.validate()?;

    if let Some(task_id) = request.task_id {
        let task: Task = TaskRepository::new(state.pool.clone())
            .find_by_id(task_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;
        if !auth.role.at_least(UserRole::Manager) && !task.is_visible_to(auth.user_id) {
            return Err(ApiError::NotFound("Task not found".into()));
        }
    }

    let repo = TimeEntryRepository::new(state.pool.clone());
    if repo.find_running(auth.user_id).await?.is_some() {
        return Err(ApiError::Conflict("A timer is already running".into()));
    }

    let entry: TimeEntry = repo
        .start(auth.user_id, request.task_id, request.note.as_deref())
        .await?
        .into();

    tracing::info!(user_id = %auth.user_id, entry_id = %entry.id, "Timer started");
    Ok((StatusCode::CREATED, Json(entry)))
}

/// POST /api/v1/timer/stop
pub async fn stop_timer(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<StopTimerRequest>,
) -> Result<Json<TimeEntry>, ApiError> {
    request.validate()?;

    let entry: TimeEntry = TimeEntryRepository::new(state.pool.clone())
        .stop_running(auth.user_id, request.note.as_deref())
        .await?
        .ok_or_else(|| ApiError::Conflict("No timer is running".into()))?
        .into();

    tracing::info!(
        user_id = %auth.user_id,
        entry_id = %entry.id,
        duration_secs = entry.duration_secs,
        "Timer stopped"
    );
    Ok(Json(entry))
}

/// GET /api/v1/timer/current
pub async fn current_timer(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<CurrentTimerResponse>, ApiError> {
    let running = TimeEntryRepository::new(state.pool.clone())
        .find_running(auth.user_id)
        .await?
        .map(TimeEntry::from);

    Ok(Json(CurrentTimerResponse::new(running, Utc::now())))
}

/// GET /api/v1/timer/entries
pub async fn list_entries(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListTimeEntriesQuery>,
) -> Result<Json<ListTimeEntriesResponse>, ApiError> {
    check_range(query.from, query.to)?;

    let limits = &state.config.limits;
    let limit = page_limit(query.limit, limits.default_page_size, limits.max_page_size);

    let entries: Vec<TimeEntry> = TimeEntryRepository::new(state.pool.clone())
        .list(auth.user_id, query.task_id, query.from, query.to, limit)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let now = Utc::now();
    let total_secs = entries.iter().map(|e| e.elapsed_secs(now)).sum();

    Ok(Json(ListTimeEntriesResponse {
        entries,
        total_secs,
    }))
}
