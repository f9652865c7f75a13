//! Task CRUD. Employees see tasks assigned to or created by them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use domain::models::task::{CreateTaskRequest, ListTasksQuery, ListTasksResponse, UpdateTaskRequest};
use domain::models::{NewNotification, Task, TaskStatus, UserRole};
use persistence::repositories::{NotificationRepository, TaskChanges, TaskFilter, TaskRepository};
use shared::pagination::page_limit;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<ListTasksResponse>, ApiError> {
    let limits = &state.config.limits;
    let per_page = page_limit(query.per_page, limits.default_page_size, limits.max_page_size);
    let page = query.page.unwrap_or(1).max(1);

    let filter = TaskFilter {
        status: query.status,
        assignee_id: if query.mine {
            Some(auth.user_id)
        } else {
            query.assignee_id
        },
        visible_to: (!auth.role.at_least(UserRole::Manager)).then_some(auth.user_id),
    };

    let repo = TaskRepository::new(state.pool.clone());
    let total = repo.count(&filter).await?;
    let tasks = repo
        .list(&filter, per_page, (page - 1) * per_page)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListTasksResponse {
        tasks,
        page,
        per_page,
        total,
    }))
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    auth.require_role(UserRole::Manager)?;
    request.validate()?;

    let completed_at = (request.status == TaskStatus::Done).then(Utc::now);
    let task: Task = TaskRepository::new(state.pool.clone())
        .create(
            auth.user_id,
            &TaskChanges {
                title: request.title.trim(),
                description: request.description.as_deref(),
                status: request.status,
                assignee_id: request.assignee_id,
                due_date: request.due_date,
                completed_at,
            },
        )
        .await?
        .into();

    tracing::info!(task_id = %task.id, created_by = %auth.user_id, "Task created");
    notify_assignee(&state, &task, None, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/v1/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(find_visible_task(&state, &auth, task_id).await?))
}

/// PATCH /api/v1/tasks/:id
///
/// Employees may edit their own tasks but cannot reassign them.
pub async fn update_task(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    request.validate()?;
    let current = find_visible_task(&state, &auth, task_id).await?;

    if request.assignee_id.is_some() && !auth.role.at_least(UserRole::Manager) {
        return Err(ApiError::Forbidden(
            "Only managers can reassign tasks".into(),
        ));
    }

    let completed_at = request.completed_at(&current, Utc::now());
    let changes = TaskChanges {
        title: request.title.as_deref().map(str::trim).unwrap_or(&current.title),
        description: request.merged_description(current.description.as_deref()),
        status: request.status.unwrap_or(current.status),
        assignee_id: request.assignee_id.unwrap_or(current.assignee_id),
        due_date: request.due_date.unwrap_or(current.due_date),
        completed_at,
    };

    let updated: Task = TaskRepository::new(state.pool.clone())
        .update(task_id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?
        .into();

    tracing::info!(
        task_id = %task_id,
        status = updated.status.as_str(),
        updated_by = %auth.user_id,
        "Task updated"
    );
    notify_assignee(&state, &updated, current.assignee_id, auth.user_id).await?;

    Ok(Json(updated))
}

/// DELETE /api/v1/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(UserRole::Manager)?;

    let deleted = TaskRepository::new(state.pool.clone())
        .soft_delete(task_id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Task not found".into()));
    }

    tracing::info!(task_id = %task_id, deleted_by = %auth.user_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Hidden tasks answer 404, not 403.
async fn find_visible_task(
    state: &AppState,
    auth: &UserAuth,
    task_id: Uuid,
) -> Result<Task, ApiError> {
    let task: Task = TaskRepository::new(state.pool.clone())
        .find_by_id(task_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    if auth.role.at_least(UserRole::Manager) || task.is_visible_to(auth.user_id) {
        Ok(task)
    } else {
        Err(ApiError::NotFound("Task not found".into()))
    }
}

/// Sends `task_assigned` to a new assignee other than the acting user.
async fn notify_assignee(
    state: &AppState,
    task: &Task,
    previous_assignee: Option<Uuid>,
    actor: Uuid,
) -> Result<(), ApiError> {
    let Some(assignee) = newly_assigned(task.assignee_id, previous_assignee, actor) else {
        return Ok(());
    };

    let mut conn = state.pool.acquire().await?;
    NotificationRepository::new(state.pool.clone())
        .insert(
            &mut *conn,
            &NewNotification::task_assigned(assignee, task.id, &task.title),
        )
        .await?;
    Ok(())
}

fn newly_assigned(current: Option<Uuid>, previous: Option<Uuid>, actor: Uuid) -> Option<Uuid> {
    current.filter(|&id| Some(id) != previous && id != actor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newly_assigned() {
        let actor = Uuid::new_v4();
        let worker = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(newly_assigned(Some(worker), None, actor), Some(worker));
        assert_eq!(newly_assigned(Some(worker), Some(other), actor), Some(worker));
        assert_eq!(newly_assigned(Some(worker), Some(worker), actor), None);
        assert_eq!(newly_assigned(Some(actor), None, actor), None);
        assert_eq!(newly_assigned(None, Some(worker), actor), None);
    }
}
