//! Authentication service: password login and refresh-token sessions.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use domain::models::user::normalize_email;
use domain::models::User;
use persistence::repositories::{SessionRepository, UserRepository};
use shared::crypto::session_fingerprint;
use shared::jwt::{extract_user_id, IssuedToken, JwtConfig, JwtError};
use shared::password::{verify_password, PasswordError};

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::AccountDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::Database(e) => ApiError::from(e),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
        }
    }
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            jwt,
        }
    }

    /// Verifies credentials and opens a session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> Result<(User, TokenPair), AuthError> {
        let user: User = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.can_sign_in() {
            return Err(AuthError::AccountDisabled);
        }

        let (pair, refresh) = self.issue(&user)?;
        self.sessions
            .create(
                user.id,
                &session_fingerprint(&refresh.jti),
                user_agent,
                refresh.expires_at,
            )
            .await?;
        self.users.update_last_login(user.id).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok((user, pair))
    }

    /// Exchanges a refresh token for a new pair, rotating the session.
    ///
    /// A validly signed token whose session no longer exists has already
    /// been rotated or revoked; every session of that user is then revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;
        let old_hash = session_fingerprint(&claims.jti);

        let Some(session) = self.sessions.find_by_token_hash(&old_hash).await? else {
            let revoked = self.sessions.delete_all_for_user(user_id).await?;
            tracing::warn!(
                user_id = %user_id,
                revoked,
                "Refresh token reuse detected; all sessions revoked"
            );
            return Err(AuthError::InvalidRefreshToken);
        };
        if session.user_id != user_id || session.expires_at <= Utc::now() {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user: User = match self.users.find_by_id(user_id).await? {
            Some(entity) => entity.into(),
            None => {
                self.sessions.delete_by_token_hash(&old_hash).await?;
                return Err(AuthError::InvalidRefreshToken);
            }
        };
        if !user.can_sign_in() {
            self.sessions.delete_all_for_user(user.id).await?;
            return Err(AuthError::AccountDisabled);
        }

        let (pair, refresh) = self.issue(&user)?;
        self.sessions
            .rotate(
                session.id,
                &old_hash,
                &session_fingerprint(&refresh.jti),
                refresh.expires_at,
            )
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        tracing::debug!(user_id = %user.id, session_id = %session.id, "Session rotated");
        Ok(pair)
    }

    /// Ends the session of `refresh_token`, or every session of its user.
    /// Returns the number of sessions removed.
    pub async fn logout(&self, refresh_token: &str, all_sessions: bool) -> Result<u64, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let removed = if all_sessions {
            let user_id: Uuid =
                extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;
            self.sessions.delete_all_for_user(user_id).await?
        } else {
            self.sessions
                .delete_by_token_hash(&session_fingerprint(&claims.jti))
                .await?
        };

        tracing::info!(sub = %claims.sub, removed, all_sessions, "User logged out");
        Ok(removed)
    }

    fn issue(&self, user: &User) -> Result<(TokenPair, IssuedToken), AuthError> {
        let access = self.jwt.generate_access_token(user.id, user.role.as_str())?;
        let refresh = self.jwt.generate_refresh_token(user.id, user.role.as_str())?;
        let pair = TokenPair {
            access_token: access.token,
            refresh_token: refresh.token.clone(),
            expires_in: self.jwt.access_token_expiry_secs,
        };
        Ok((pair, refresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidRefreshToken, StatusCode::UNAUTHORIZED),
            (AuthError::AccountDisabled, StatusCode::FORBIDDEN),
            (
                AuthError::Token(JwtError::InvalidToken),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::Database(sqlx::Error::RowNotFound),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_credentials_error_message_is_generic() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }
}
