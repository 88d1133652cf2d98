use crate::domain::ports::{NotificationDispatcher, NotificationRepository};
use crate::errors::EngineResult;
use crate::models::{Notification, Ticket};
use std::sync::Arc;
use tracing::info;

/// Default NotificationDispatcher: in-app notifications land in storage,
/// escalation emails are handed to the (external) delivery pipeline. Actual
/// transport is out of scope here; the engine only decides that and when a
/// message fires.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<dyn NotificationRepository>) -> Self {
        Self { notification_repo }
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for NotificationService {
    async fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        link: &str,
    ) -> EngineResult<()> {
        let notification = Notification::new(
            user_id.to_string(),
            title.to_string(),
            message.to_string(),
            link.to_string(),
        );
        self.notification_repo
            .create_notification(&notification)
            .await?;
        Ok(())
    }

    async fn send_escalation_email(
        &self,
        user_email: &str,
        ticket: &Ticket,
        level: i64,
        trigger_percent: i64,
    ) -> EngineResult<()> {
        info!(
            "Escalation email queued: to={} ticket={} level={} trigger={}%",
            user_email, ticket.id, level, trigger_percent
        );
        Ok(())
    }
}
