//! Website restrictions.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::restriction::{CheckUrlRequest, CheckUrlResponse, RestrictionsResponse};
use domain::services::{find_block, normalize_domain};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::routes::organization::load_settings;

/// GET /api/v1/restrictions
pub async fn list_restrictions(
    State(state): State<AppState>,
    _auth: UserAuth,
) -> Result<Json<RestrictionsResponse>, ApiError> {
    let settings = load_settings(&state).await?;
    Ok(Json(RestrictionsResponse {
        enabled: settings.website_restrictions_enabled,
        blocked_domains: settings.blocked_domains,
    }))
}

/// POST /api/v1/restrictions/check
///
/// Nothing is blocked while restrictions are disabled.
pub async fn check_url(
    State(state): State<AppState>,
    _auth: UserAuth,
    Json(request): Json<CheckUrlRequest>,
) -> Result<Json<CheckUrlResponse>, ApiError> {
    request.validate()?;

    let settings = load_settings(&state).await?;
    Ok(Json(evaluate_url(
        request.url,
        settings.website_restrictions_enabled,
        &settings.blocked_domains,
    )))
}

fn evaluate_url(url: String, enabled: bool, blocked_domains: &[String]) -> CheckUrlResponse {
    let domain = normalize_domain(&url);
    let matched = if enabled {
        find_block(&url, blocked_domains).map(str::to_string)
    } else {
        None
    };
    CheckUrlResponse {
        url,
        domain,
        blocked: matched.is_some(),
        matched,
    }
}
