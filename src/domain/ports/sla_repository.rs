use crate::errors::EngineResult;
use crate::models::{
    Holiday, SlaEscalation, SlaEscalationRule, SlaPolicy, SlaRule, SlaStatus, TicketEvent,
    TicketSlaTracking,
};

/// Repository for SLA engine state: policies, rules, holidays, trackings,
/// escalation tiers, audit records, and the ticket event log.
#[async_trait::async_trait]
pub trait SlaRepository: Send + Sync {
    // Policy operations
    async fn create_sla_policy(&self, policy: &SlaPolicy) -> EngineResult<()>;
    async fn get_sla_policy(&self, policy_id: &str) -> EngineResult<Option<SlaPolicy>>;
    /// Most recently activated active policy, if any.
    async fn get_active_sla_policy(&self) -> EngineResult<Option<SlaPolicy>>;
    async fn set_sla_policy_active(&self, policy_id: &str, active: bool) -> EngineResult<()>;

    // Rule operations
    async fn create_sla_rule(&self, rule: &SlaRule) -> EngineResult<()>;
    /// Enabled rule for (policy, priority); exact label match, lowest id wins.
    async fn get_enabled_rule(
        &self,
        policy_id: &str,
        priority: &str,
    ) -> EngineResult<Option<SlaRule>>;
    async fn get_sla_rule(&self, rule_id: &str) -> EngineResult<Option<SlaRule>>;

    // Holiday operations
    async fn create_holiday(&self, holiday: &Holiday) -> EngineResult<()>;
    async fn list_holidays(&self) -> EngineResult<Vec<Holiday>>;

    // Tracking operations
    async fn upsert_tracking(&self, tracking: &TicketSlaTracking) -> EngineResult<()>;
    async fn get_tracking_by_ticket(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Option<TicketSlaTracking>>;
    /// Trackings whose ticket is open and resolution is not yet completed.
    async fn list_open_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>>;
    async fn list_breached_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>>;
    async fn update_tracking_evaluation(
        &self,
        tracking_id: &str,
        status: SlaStatus,
        percent_consumed: f64,
        response_breached: bool,
        resolution_breached: bool,
    ) -> EngineResult<()>;
    async fn set_tracking_response_completed(
        &self,
        tracking_id: &str,
        completed_at: &str,
        breached: bool,
    ) -> EngineResult<()>;
    async fn set_tracking_resolution_completed(
        &self,
        tracking_id: &str,
        completed_at: &str,
        breached: bool,
    ) -> EngineResult<()>;

    // Escalation rule operations
    async fn create_escalation_rule(&self, rule: &SlaEscalationRule) -> EngineResult<()>;
    /// Escalation tiers for a policy, ascending by level.
    async fn list_escalation_rules(&self, policy_id: &str)
        -> EngineResult<Vec<SlaEscalationRule>>;

    // Escalation audit operations
    async fn escalation_exists(&self, tracking_id: &str, level: i64) -> EngineResult<bool>;
    /// Insert honoring UNIQUE(tracking_id, level); Err(Conflict) when the
    /// level already fired.
    async fn insert_escalation(&self, escalation: &SlaEscalation) -> EngineResult<()>;
    async fn update_escalation_outcome(
        &self,
        escalation_id: &str,
        reassigned_to: Option<&str>,
        notified_user_ids: &[String],
    ) -> EngineResult<()>;
    async fn list_escalations_by_ticket(&self, ticket_id: &str)
        -> EngineResult<Vec<SlaEscalation>>;

    // Ticket event log
    async fn append_ticket_event(&self, event: &TicketEvent) -> EngineResult<()>;
    async fn list_ticket_events(&self, ticket_id: &str) -> EngineResult<Vec<TicketEvent>>;
}
