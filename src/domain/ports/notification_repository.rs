use crate::errors::EngineResult;
use crate::models::Notification;

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(&self, notification: &Notification) -> EngineResult<()>;
    async fn list_notifications_for_user(&self, user_id: &str) -> EngineResult<Vec<Notification>>;
}
