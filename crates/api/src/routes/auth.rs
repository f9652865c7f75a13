//! Login, token refresh, logout and the current user.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::user::UserResponse;
use domain::models::User;
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;
use crate::services::auth::{AuthService, TokenPair};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogoutRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,

    /// End every session of the user, not just this one.
    #[serde(default)]
    pub all_sessions: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<TokenPair> for TokensResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokensResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub sessions_ended: u64,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.pool.clone(), state.jwt.clone())
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| &ua[..ua.len().min(512)]);

    let (user, tokens) = auth_service(&state)
        .login(&request.email, &request.password, user_agent)
        .await?;

    Ok(Json(LoginResponse {
        user: user.into(),
        tokens: tokens.into(),
    }))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokensResponse>, ApiError> {
    request.validate()?;
    let tokens = auth_service(&state).refresh(&request.refresh_token).await?;
    Ok(Json(tokens.into()))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<LogoutResponse>, ApiError> {
    request.validate()?;
    let sessions_ended = auth_service(&state)
        .logout(&request.refresh_token, request.all_sessions)
        .await?;
    Ok(Json(LogoutResponse { sessions_ended }))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UserResponse>, ApiError> {
    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?
        .into();
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            email: "worker@example.com".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "nope".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_logout_request_defaults_to_single_session() {
        let request: LogoutRequest =
            serde_json::from_str(r#"{"refresh_token":"abc"}"#).unwrap();
        assert!(!request.all_sessions);
    }

    #[test]
    fn test_tokens_response_shape() {
        let response = TokensResponse::from(TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in: 900,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 900);
        assert_eq!(json["access_token"], "a");
    }
}
