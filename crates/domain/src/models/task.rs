//! Task domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Workflow state of a task. Any state may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether `user_id` may read or update the task without a manager role.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.assignee_id == Some(user_id) || self.created_by == user_id
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    pub assignee_id: Option<Uuid>,

    pub due_date: Option<NaiveDate>,
}

/// Partial update. `null` clears `description`, `assignee_id` or `due_date`;
/// an absent field keeps it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl UpdateTaskRequest {
    /// Description after the update.
    pub fn merged_description<'a>(&'a self, current: Option<&'a str>) -> Option<&'a str> {
        match &self.description {
            Some(new) => new.as_deref(),
            None => current,
        }
    }

    /// New `completed_at` given the current task: set when moving to done,
    /// cleared when leaving done, otherwise unchanged.
    pub fn completed_at(&self, current: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.status {
            Some(TaskStatus::Done) if current.status != TaskStatus::Done => Some(now),
            Some(TaskStatus::Done) => current.completed_at,
            Some(_) => None,
            None => current.completed_at,
        }
    }
}


#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    /// Only tasks assigned to the caller.
    #[serde(default)]
    pub mine: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Inspect van".into(),
            description: None,
            status,
            assignee_id: None,
            created_by: Uuid::new_v4(),
            due_date: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(TaskStatus::parse("done"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("blocked"), None);
    }

    #[test]
    fn test_completed_at_transitions() {
        let now = Utc::now();
        let open = task(TaskStatus::Todo);

        let done = UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert_eq!(done.completed_at(&open, now), Some(now));

        let mut finished = task(TaskStatus::Done);
        let earlier = now - chrono::Duration::hours(3);
        finished.completed_at = Some(earlier);
        assert_eq!(done.completed_at(&finished, now), Some(earlier));

        let reopen = UpdateTaskRequest {
            status: Some(TaskStatus::Todo),
            ..Default::default()
        };
        assert_eq!(reopen.completed_at(&finished, now), None);

        let rename = UpdateTaskRequest {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert_eq!(rename.completed_at(&finished, now), Some(earlier));
    }

    #[test]
    fn test_update_distinguishes_null_and_absent_assignee() {
        let absent: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assignee_id, None);

        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateTaskRequest =
            serde_json::from_str(&format!(r#"{{"assignee_id": "{id}"}}"#)).unwrap();
        assert_eq!(set.assignee_id, Some(Some(id)));
    }

    #[test]
    fn test_description_can_be_cleared() {
        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.merged_description(Some("Old notes")), None);

        let kept: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(kept.merged_description(Some("Old notes")), Some("Old notes"));

        let long = "x".repeat(5001);
        let too_long: UpdateTaskRequest =
            serde_json::from_str(&format!(r#"{{"description": "{long}"}}"#)).unwrap();
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_visibility() {
        let mut t = task(TaskStatus::Todo);
        let worker = Uuid::new_v4();
        assert!(!t.is_visible_to(worker));
        t.assignee_id = Some(worker);
        assert!(t.is_visible_to(worker));
        assert!(t.is_visible_to(t.created_by));
    }

    #[test]
    fn test_create_validation() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(req.validate().is_err());
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "Load pallets", "due_date": "2024-06-01"}"#)
                .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status, TaskStatus::Todo);
    }
}
