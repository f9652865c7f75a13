//! Notification inbox repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use domain::models::NewNotification;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

/// Repository for notifications.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a notification.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        notification: &NewNotification,
    ) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.data)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// A page of the user's inbox, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        before: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications");
        let (before_at, before_id) = match before {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1
              AND (NOT $2 OR read_at IS NULL)
              AND ($3::TIMESTAMPTZ IS NULL OR (created_at, id) < ($3, $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(before_at)
        .bind(before_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count unread notifications.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_unread_notifications");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Mark one notification read. Already-read notifications keep their
    /// original `read_at`.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_read");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Mark every unread notification read.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_all_notifications_read");
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read_at = NOW()
            WHERE user_id = $1 AND read_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
