//! Organization-wide settings.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::organization_settings::UpdateOrganizationSettingsRequest;
use domain::models::{OrganizationSettings, UserRole};
use persistence::repositories::OrganizationSettingsRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// Current settings, or defaults when the row has not been seeded.
pub(crate) async fn load_settings(state: &AppState) -> Result<OrganizationSettings, ApiError> {
    Ok(OrganizationSettingsRepository::new(state.pool.clone())
        .get()
        .await?
        .map(Into::into)
        .unwrap_or_default())
}

/// GET /api/v1/organization/settings
pub async fn get_settings(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<Json<OrganizationSettings>, ApiError> {
    Ok(Json(load_settings(&state).await?))
}

/// PUT /api/v1/organization/settings
///
/// Absent fields keep their current value.
pub async fn update_settings(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdateOrganizationSettingsRequest>,
) -> Result<Json<OrganizationSettings>, ApiError> {
    auth.require_role(UserRole::Admin)?;
    request.validate()?;

    let merged = request.apply(load_settings(&state).await?);
    let saved: OrganizationSettings = OrganizationSettingsRepository::new(state.pool.clone())
        .save(&merged, auth.user_id)
        .await?
        .into();

    tracing::info!(
        updated_by = %auth.user_id,
        gps_tracking_enabled = saved.gps_tracking_enabled,
        auto_clock_enabled = saved.auto_clock_enabled,
        blocked_domains = saved.blocked_domains.len(),
        "Organization settings updated"
    );
    Ok(Json(saved))
}
