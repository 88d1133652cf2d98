use crate::errors::EngineResult;
use crate::infrastructure::persistence::Database;
use crate::models::Notification;
use sqlx::Row;

impl Database {
    pub async fn create_notification(&self, notification: &Notification) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, link, read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .bind(notification.read)
        .bind(&notification.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn list_notifications_for_user(
        &self,
        user_id: &str,
    ) -> EngineResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, message, link, read, created_at
             FROM notifications WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Notification {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    title: row.try_get("title")?,
                    message: row.try_get("message")?,
                    link: row.try_get("link")?,
                    read: row.try_get::<i64, _>("read")? != 0,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

// Implement NotificationRepository trait for Database
#[async_trait::async_trait]
impl crate::domain::ports::NotificationRepository for Database {
    async fn create_notification(&self, notification: &Notification) -> EngineResult<()> {
        self.create_notification(notification).await
    }

    async fn list_notifications_for_user(
        &self,
        user_id: &str,
    ) -> EngineResult<Vec<Notification>> {
        self.list_notifications_for_user(user_id).await
    }
}
