//! Task repository for database operations.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::TaskStatus;

use crate::entities::TaskEntity;
use crate::metrics::QueryTimer;

/// Filters for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    /// Restrict to tasks assigned to or created by this user.
    pub visible_to: Option<Uuid>,
}

/// Full set of mutable task columns, resolved by the caller.
#[derive(Debug, Clone)]
pub struct TaskChanges<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Repository for task-related database operations.
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Creates a new TaskRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a task.
    pub async fn create(
        &self,
        created_by: Uuid,
        changes: &TaskChanges<'_>,
    ) -> Result<TaskEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_task");
        let result = sqlx::query_as::<_, TaskEntity>(
            r#"
            INSERT INTO tasks (title, description, status, assignee_id, created_by, due_date, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status.as_str())
        .bind(changes.assignee_id)
        .bind(created_by)
        .bind(changes.due_date)
        .bind(changes.completed_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a non-deleted task by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_task_by_id");
        let result = sqlx::query_as::<_, TaskEntity>(
            r#"
            SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List tasks, newest first.
    pub async fn list(
        &self,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tasks");
        let result = sqlx::query_as::<_, TaskEntity>(
            r#"
            SELECT * FROM tasks
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR assignee_id = $2)
              AND ($3::UUID IS NULL OR assignee_id = $3 OR created_by = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.assignee_id)
        .bind(filter.visible_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count tasks matching a filter.
    pub async fn count(&self, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_tasks");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR assignee_id = $2)
              AND ($3::UUID IS NULL OR assignee_id = $3 OR created_by = $3)
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.assignee_id)
        .bind(filter.visible_to)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Overwrite the mutable columns of a task.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &TaskChanges<'_>,
    ) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_task");
        let result = sqlx::query_as::<_, TaskEntity>(
            r#"
            UPDATE tasks SET
                title = $2,
                description = $3,
                status = $4,
                assignee_id = $5,
                due_date = $6,
                completed_at = $7,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status.as_str())
        .bind(changes.assignee_id)
        .bind(changes.due_date)
        .bind(changes.completed_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft delete a task.
    pub async fn soft_delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("soft_delete_task");
        let result = sqlx::query(
            r#"
            UPDATE tasks SET deleted_at = NOW(), updated_at = NOW()
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
