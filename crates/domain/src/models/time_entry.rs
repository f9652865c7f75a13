//! Task timer entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One timed interval. Running while `stopped_at` is `None`; a user has at
/// most one running entry.
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.stopped_at.is_none()
    }

    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        self.duration_secs
            .unwrap_or_else(|| (now - self.started_at).num_seconds().max(0))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StartTimerRequest {
    pub task_id: Option<Uuid>,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StopTimerRequest {
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentTimerResponse {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<TimeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<i64>,
}

impl CurrentTimerResponse {
    pub fn new(entry: Option<TimeEntry>, now: DateTime<Utc>) -> Self {
        let elapsed_secs = entry.as_ref().map(|e| e.elapsed_secs(now));
        Self {
            running: entry.is_some(),
            entry,
            elapsed_secs,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTimeEntriesQuery {
    pub task_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTimeEntriesResponse {
    pub entries: Vec<TimeEntry>,
    pub total_secs: i64,
}
