use crate::errors::EngineResult;
use crate::models::Ticket;

/// Delivery of notifications is an external concern; the engine only decides
/// that and when an action fires.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// In-app notification for one user.
    async fn notify(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        link: &str,
    ) -> EngineResult<()>;

    /// Escalation email for one recipient.
    async fn send_escalation_email(
        &self,
        user_email: &str,
        ticket: &Ticket,
        level: i64,
        trigger_percent: i64,
    ) -> EngineResult<()>;
}
