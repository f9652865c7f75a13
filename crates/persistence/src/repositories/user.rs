//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::UserRole;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Filters for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub include_deleted: bool,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a non-deleted user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a non-deleted user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a new user. Email must already be normalized.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, password_hash, display_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List users page by page, ordered by creation time.
    pub async fn list(
        &self,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE ($1::TEXT IS NULL OR role = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
              AND ($3 OR deleted_at IS NULL)
            ORDER BY created_at ASC, id ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.is_active)
        .bind(filter.include_deleted)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count users matching a filter.
    pub async fn count(&self, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::TEXT IS NULL OR role = $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
              AND ($3 OR deleted_at IS NULL)
            "#,
        )
        .bind(filter.role.map(|r| r.as_str()))
        .bind(filter.is_active)
        .bind(filter.include_deleted)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Count active, non-deleted admins.
    pub async fn count_active_admins(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_admins");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE role = 'admin' AND is_active = true AND deleted_at IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Update a user (partial update).
    /// Only provided fields are updated; None values are preserved.
    pub async fn update(
        &self,
        id: Uuid,
        email: Option<&str>,
        password_hash: Option<&str>,
        display_name: Option<&str>,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                display_name = COALESCE($4, display_name),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(display_name)
        .bind(role.map(|r| r.as_str()))
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("update_last_login");
        let result = sqlx::query(
            r#"
            UPDATE users SET last_login_at = NOW() WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Soft delete a user and deactivate the account.
    /// Returns the number of rows affected (0 or 1).
    pub async fn soft_delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_user");
        let result = sqlx::query(
            r#"
            UPDATE users SET deleted_at = NOW(), is_active = false, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
