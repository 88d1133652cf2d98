use crate::errors::EngineResult;
use crate::models::Ticket;

/// Ticket CRUD lives elsewhere; this is the narrow read/write surface the
/// SLA engine needs.
#[async_trait::async_trait]
pub trait TicketStore: Send + Sync {
    async fn get_ticket(&self, ticket_id: &str) -> EngineResult<Option<Ticket>>;
    /// Ids of tickets not in {resolved, closed}.
    async fn open_ticket_ids(&self) -> EngineResult<Vec<String>>;
    /// Mirror the resolution due instant onto the ticket for dashboards.
    async fn set_sla_due(&self, ticket_id: &str, due_at: &str) -> EngineResult<()>;
    async fn set_assignee(&self, ticket_id: &str, user_id: &str) -> EngineResult<()>;
    /// Ids of tickets resolved strictly before the cutoff and not yet closed.
    async fn resolved_before(&self, cutoff: &str) -> EngineResult<Vec<String>>;
    async fn close_ticket(&self, ticket_id: &str) -> EngineResult<()>;
}
