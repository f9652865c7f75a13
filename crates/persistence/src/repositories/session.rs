//! Session repository for refresh-token sessions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserSessionEntity;
use crate::metrics::QueryTimer;

/// Repository for user_sessions.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new SessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a session keyed by the hash of its refresh token id.
    pub async fn create(
        &self,
        user_id: Uuid,
        refresh_token_hash: &str,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            INSERT INTO user_sessions (user_id, refresh_token_hash, user_agent, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(refresh_token_hash)
        .bind(user_agent)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a session by refresh token hash.
    pub async fn find_by_token_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session_by_token_hash");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            SELECT * FROM user_sessions WHERE refresh_token_hash = $1
            "#,
        )
        .bind(refresh_token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Swap the refresh token of a session. Fails to match when the old hash
    /// was already rotated, so a replayed token finds nothing.
    pub async fn rotate(
        &self,
        id: Uuid,
        old_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<UserSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("rotate_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            UPDATE user_sessions
            SET refresh_token_hash = $3, expires_at = $4, last_used_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(old_hash)
        .bind(new_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete one session by refresh token hash.
    pub async fn delete_by_token_hash(&self, refresh_token_hash: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_session");
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions WHERE refresh_token_hash = $1
            "#,
        )
        .bind(refresh_token_hash)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Delete every session of a user.
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_sessions");
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Delete sessions whose refresh token has expired.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_sessions");
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
