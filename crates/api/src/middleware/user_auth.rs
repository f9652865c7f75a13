//! Bearer-token authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use domain::models::UserRole;
use shared::jwt::{extract_user_id, JwtConfig};

use crate::app::AppState;
use crate::error::ApiError;

/// Caller identity taken from a valid access token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    pub role: UserRole,
    /// JWT ID of the access token.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt.validate_access_token(token).map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".into()))?;
        let role = claims
            .role
            .parse::<UserRole>()
            .map_err(|_| ApiError::Unauthorized("Invalid role in token".into()))?;

        Ok(Self {
            user_id,
            role,
            jti: claims.jti,
        })
    }

    /// Fails with 403 unless the caller holds `required` or a higher role.
    pub fn require_role(&self, required: UserRole) -> Result<(), ApiError> {
        if self.role.at_least(required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Requires {} role",
                required.as_str()
            )))
        }
    }

    /// Resolves the user a read should target: the caller by default, another
    /// user only for managers and above.
    pub fn target_user(&self, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
        match requested {
            Some(other) if other != self.user_id => {
                self.require_role(UserRole::Manager)?;
                Ok(other)
            }
            _ => Ok(self.user_id),
        }
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid access token and stores [`UserAuth`]
/// in the request extensions.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::Unauthorized("Missing or invalid Authorization header".into())
            .into_response();
    };

    match UserAuth::validate(&state.jwt, token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jwt() -> JwtConfig {
        JwtConfig::from_secret("unit-test-secret-unit-test-secret", 900, 3600, 30).unwrap()
    }

    fn auth(role: UserRole) -> UserAuth {
        UserAuth {
            user_id: Uuid::new_v4(),
            role,
            jti: "jti".into(),
        }
    }

    #[test]
    fn test_validate_round_trip() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();
        let issued = jwt.generate_access_token(user_id, "manager").unwrap();

        let auth = UserAuth::validate(&jwt, &issued.token).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, UserRole::Manager);
        assert_eq!(auth.jti, issued.jti);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt = jwt();
        let issued = jwt.generate_refresh_token(Uuid::new_v4(), "employee").unwrap();
        assert!(matches!(
            UserAuth::validate(&jwt, &issued.token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(UserAuth::validate(&jwt(), "not-a-jwt").is_err());
    }

    #[test]
    fn test_require_role_hierarchy() {
        assert!(auth(UserRole::Admin).require_role(UserRole::Manager).is_ok());
        assert!(auth(UserRole::Manager).require_role(UserRole::Manager).is_ok());
        assert!(matches!(
            auth(UserRole::Employee).require_role(UserRole::Manager),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_target_user() {
        let employee = auth(UserRole::Employee);
        assert_eq!(employee.target_user(None).unwrap(), employee.user_id);
        assert_eq!(
            employee.target_user(Some(employee.user_id)).unwrap(),
            employee.user_id
        );
        assert!(employee.target_user(Some(Uuid::new_v4())).is_err());

        let manager = auth(UserRole::Manager);
        let other = Uuid::new_v4();
        assert_eq!(manager.target_user(Some(other)).unwrap(), other);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
