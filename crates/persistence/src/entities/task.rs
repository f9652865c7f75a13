//! Task entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Task, TaskStatus};

/// Database row mapping for the tasks table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<TaskEntity> for Task {
    fn from(entity: TaskEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            status: TaskStatus::parse(&entity.status).unwrap_or_default(),
            assignee_id: entity.assignee_id,
            created_by: entity.created_by,
            due_date: entity.due_date,
            completed_at: entity.completed_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
