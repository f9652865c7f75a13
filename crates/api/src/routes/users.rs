//! User management (admin; listing is open to managers).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::user::{
    normalize_email, CreateUserRequest, ListUsersQuery, ListUsersResponse, UpdateUserRequest,
    UserResponse,
};
use domain::models::{User, UserRole};
use persistence::repositories::{SessionRepository, UserFilter, UserRepository};
use shared::password::{check_password_strength, hash_password};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    auth.require_role(UserRole::Manager)?;

    let limits = &state.config.limits;
    let per_page = shared::pagination::page_limit(
        query.per_page,
        limits.default_page_size,
        limits.max_page_size,
    );
    let page = query.page.unwrap_or(1).max(1);
    let filter = UserFilter {
        role: query.role,
        is_active: query.is_active,
        // Deleted accounts stay hidden from managers.
        include_deleted: query.include_deleted && auth.role.at_least(UserRole::Admin),
    };

    let repo = UserRepository::new(state.pool.clone());
    let total = repo.count(&filter).await?;
    let users = repo
        .list(&filter, per_page, (page - 1) * per_page)
        .await?
        .into_iter()
        .map(|e| UserResponse::from(User::from(e)))
        .collect();

    Ok(Json(ListUsersResponse {
        users,
        page,
        per_page,
        total,
    }))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    auth.require_role(UserRole::Admin)?;
    request.validate()?;
    check_password_strength(&request.password)?;

    let password_hash = hash_password(&request.password)?;
    let user: User = UserRepository::new(state.pool.clone())
        .create(
            &normalize_email(&request.email),
            &password_hash,
            request.display_name.trim(),
            request.role,
        )
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already registered".into()),
            other => other,
        })?
        .into();

    tracing::info!(user_id = %user.id, role = %user.role, created_by = %auth.user_id, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_role(UserRole::Admin)?;
    let user = find_user(&state, user_id).await?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/:id
///
/// Role changes and deactivation end the user's sessions.
pub async fn update_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth.require_role(UserRole::Admin)?;
    request.validate()?;

    let current = find_user(&state, user_id).await?;
    let repo = UserRepository::new(state.pool.clone());

    let loses_admin = current.role == UserRole::Admin
        && current.is_active
        && (request.role.is_some_and(|r| r != UserRole::Admin) || request.is_active == Some(false));
    if loses_admin && repo.count_active_admins().await? <= 1 {
        return Err(ApiError::Conflict(
            "Cannot demote or deactivate the last active admin".into(),
        ));
    }

    let password_hash = match request.password.as_deref() {
        Some(password) => {
            check_password_strength(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };
    let email = request.email.as_deref().map(normalize_email);

    let updated: User = repo
        .update(
            user_id,
            email.as_deref(),
            password_hash.as_deref(),
            request.display_name.as_deref().map(str::trim),
            request.role,
            request.is_active,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?
        .into();

    let revoke = updated.role != current.role
        || (current.is_active && !updated.is_active)
        || password_hash.is_some();
    if revoke {
        let ended = SessionRepository::new(state.pool.clone())
            .delete_all_for_user(user_id)
            .await?;
        tracing::info!(user_id = %user_id, ended, "Sessions ended after account change");
    }

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(UserRole::Admin)?;
    if user_id == auth.user_id {
        return Err(ApiError::Conflict("Cannot delete your own account".into()));
    }

    let current = find_user(&state, user_id).await?;
    let repo = UserRepository::new(state.pool.clone());
    if current.role == UserRole::Admin && current.is_active && repo.count_active_admins().await? <= 1
    {
        return Err(ApiError::Conflict("Cannot delete the last active admin".into()));
    }

    if repo.soft_delete(user_id).await? == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }
    SessionRepository::new(state.pool.clone())
        .delete_all_for_user(user_id)
        .await?;

    tracing::info!(user_id = %user_id, deleted_by = %auth.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}
