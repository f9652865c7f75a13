//! Geofence CRUD and stateless point checks.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::geofence::{
    check_point, CheckPointRequest, CheckPointResponse, CreateGeofenceRequest, GeofenceResponse,
    ListGeofencesQuery, ListGeofencesResponse, UpdateGeofenceRequest,
};
use domain::models::{Geofence, UserRole};
use domain::services::GeoPoint;
use persistence::entities::ShapeColumns;
use persistence::repositories::{GeofenceFields, GeofenceRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// GET /api/v1/gps/geofences
pub async fn list_geofences(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListGeofencesQuery>,
) -> Result<Json<ListGeofencesResponse>, ApiError> {
    let include_deleted = query.include_deleted && auth.role.at_least(UserRole::Manager);

    let geofences: Vec<GeofenceResponse> = GeofenceRepository::new(state.pool.clone())
        .list(query.active, include_deleted)
        .await?
        .into_iter()
        .map(|e| GeofenceResponse::from(Geofence::from(e)))
        .collect();

    Ok(Json(ListGeofencesResponse {
        total: geofences.len(),
        geofences,
    }))
}

/// POST /api/v1/gps/geofences
pub async fn create_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateGeofenceRequest>,
) -> Result<(StatusCode, Json<GeofenceResponse>), ApiError> {
    auth.require_role(UserRole::Manager)?;
    request.validate()?;
    let shape = request.to_shape()?;

    let repo = GeofenceRepository::new(state.pool.clone());
    let max = state.config.limits.max_geofences;
    if repo.count().await? >= max {
        return Err(ApiError::Conflict(format!(
            "Geofence limit of {} reached",
            max
        )));
    }

    let fields = GeofenceFields {
        name: request.name.trim(),
        description: request.description.as_deref(),
        auto_clock_in: request.auto_clock_in,
        auto_clock_out: request.auto_clock_out,
        active: request.active,
    };
    let geofence: Geofence = repo
        .create(&fields, &ShapeColumns::from(&shape), auth.user_id)
        .await?
        .into();

    tracing::info!(
        geofence_id = %geofence.id,
        shape = geofence.shape.kind().as_str(),
        created_by = %auth.user_id,
        "Geofence created"
    );
    Ok((StatusCode::CREATED, Json(geofence.into())))
}

/// GET /api/v1/gps/geofences/:id
pub async fn get_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(geofence_id): Path<Uuid>,
) -> Result<Json<GeofenceResponse>, ApiError> {
    let include_deleted = auth.role.at_least(UserRole::Manager);
    let geofence = find_geofence(&state, geofence_id, include_deleted).await?;
    Ok(Json(geofence.into()))
}

/// PATCH /api/v1/gps/geofences/:id
pub async fn update_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(geofence_id): Path<Uuid>,
    Json(request): Json<UpdateGeofenceRequest>,
) -> Result<Json<GeofenceResponse>, ApiError> {
    auth.require_role(UserRole::Manager)?;
    request.validate()?;

    let current = find_geofence(&state, geofence_id, false).await?;
    let shape = request.merge_shape(&current.shape)?;

    let fields = GeofenceFields {
        name: request.name.as_deref().map(str::trim).unwrap_or(&current.name),
        description: request.merged_description(current.description.as_deref()),
        auto_clock_in: request.auto_clock_in.unwrap_or(current.auto_clock_in),
        auto_clock_out: request.auto_clock_out.unwrap_or(current.auto_clock_out),
        active: request.active.unwrap_or(current.active),
    };

    let updated: Geofence = GeofenceRepository::new(state.pool.clone())
        .update(geofence_id, &fields, &ShapeColumns::from(&shape))
        .await?
        .ok_or_else(|| ApiError::NotFound("Geofence not found".into()))?
        .into();

    tracing::info!(geofence_id = %geofence_id, updated_by = %auth.user_id, "Geofence updated");
    Ok(Json(updated.into()))
}

/// DELETE /api/v1/gps/geofences/:id
///
/// Soft delete; past geo-events keep their reference.
pub async fn delete_geofence(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(geofence_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(UserRole::Manager)?;

    let deleted = GeofenceRepository::new(state.pool.clone())
        .soft_delete(geofence_id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Geofence not found".into()));
    }

    tracing::info!(geofence_id = %geofence_id, deleted_by = %auth.user_id, "Geofence deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/gps/geofences/check
pub async fn check_geofences(
    State(state): State<AppState>,
    _auth: UserAuth,
    Json(request): Json<CheckPointRequest>,
) -> Result<Json<CheckPointResponse>, ApiError> {
    request.validate()?;

    let geofences: Vec<Geofence> = GeofenceRepository::new(state.pool.clone())
        .list(Some(true), false)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(check_point(
        &geofences,
        GeoPoint::new(request.latitude, request.longitude),
    )))
}

async fn find_geofence(
    state: &AppState,
    geofence_id: Uuid,
    include_deleted: bool,
) -> Result<Geofence, ApiError> {
    GeofenceRepository::new(state.pool.clone())
        .find_by_id(geofence_id, include_deleted)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Geofence not found".into()))
}
