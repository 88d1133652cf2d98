use crate::domain::ports::{SlaRepository, TicketStore};
use crate::errors::{EngineError, EngineResult};
use crate::events::{EventBus, SystemEvent};
use crate::models::{
    SlaEscalation, SlaStatus, TicketEvent, TicketEventType, TicketSlaTracking,
};
use crate::services::calendar::WorkingCalendar;
use crate::services::due_time::DueTimeCalculator;
use crate::services::policy_resolver::PolicyResolver;
use chrono::{DateTime, Utc, Weekday};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of initializing SLA tracking for a ticket.
#[derive(Debug, Clone)]
pub enum InitializeOutcome {
    /// Tracking row created (or overwritten on reopen).
    Tracked(TicketSlaTracking),
    /// No active policy or no matching rule; the ticket has no SLA.
    NotApplicable,
}

/// One evaluation step for a tracking row.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub percent_consumed: f64,
    pub status: SlaStatus,
    pub status_changed: bool,
}

/// Owns per-ticket tracking state: due times, breach flags, percent-consumed.
/// Initialized at ticket creation, re-evaluated by the scheduler loop.
#[derive(Clone)]
pub struct TrackingService {
    sla_repo: Arc<dyn SlaRepository>,
    ticket_store: Arc<dyn TicketStore>,
    resolver: PolicyResolver,
    event_bus: Arc<EventBus>,
}

impl TrackingService {
    pub fn new(
        sla_repo: Arc<dyn SlaRepository>,
        ticket_store: Arc<dyn TicketStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let resolver = PolicyResolver::new(sla_repo.clone());
        Self {
            sla_repo,
            ticket_store,
            resolver,
            event_bus,
        }
    }

    pub fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    /// Load the working-calendar snapshot for one evaluation pass.
    pub async fn load_calendar(&self) -> EngineResult<WorkingCalendar> {
        let holidays = self.sla_repo.list_holidays().await?;
        Ok(WorkingCalendar::from_holidays(Weekday::Sun, &holidays))
    }

    /// Set up (or reset, e.g. on reopen) SLA tracking for a ticket.
    /// Missing policy or rule is a recognized outcome, not an error.
    pub async fn initialize(&self, ticket_id: &str) -> EngineResult<InitializeOutcome> {
        let ticket = self
            .ticket_store
            .get_ticket(ticket_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("Ticket not found: {}", ticket_id)))?;

        let policy = match self.resolver.active_policy().await? {
            Some(policy) => policy,
            None => {
                info!("No active SLA policy; skipping tracking for ticket {}", ticket_id);
                return Ok(InitializeOutcome::NotApplicable);
            }
        };

        let rule = match self.resolver.resolve_rule(&policy.id, &ticket.priority).await? {
            Some(rule) => rule,
            None => {
                info!(
                    "No SLA rule for priority {:?} on policy {}; skipping ticket {}",
                    ticket.priority, policy.id, ticket_id
                );
                return Ok(InitializeOutcome::NotApplicable);
            }
        };

        let now = Utc::now();
        let calendar = self.load_calendar().await?;
        let calc = DueTimeCalculator::new(&calendar);

        let response_due = calc.due_after(now, rule.response_time_minutes);
        let resolution_due = calc.due_after(now, rule.resolution_budget_minutes());

        let tracking = TicketSlaTracking::new(
            ticket_id.to_string(),
            policy.id.clone(),
            rule.id.clone(),
            response_due.to_rfc3339(),
            resolution_due.to_rfc3339(),
            now.to_rfc3339(),
        );

        self.sla_repo.upsert_tracking(&tracking).await?;

        // Mirror the resolution due onto the ticket for cheap dashboard queries
        self.ticket_store
            .set_sla_due(ticket_id, &tracking.resolution_due)
            .await?;

        self.sla_repo
            .append_ticket_event(&TicketEvent::new(
                ticket_id.to_string(),
                TicketEventType::SlaStarted,
                json!({
                    "tracking_id": tracking.id,
                    "policy_id": policy.id,
                    "rule_id": rule.id,
                    "response_due": tracking.response_due,
                    "resolution_due": tracking.resolution_due,
                }),
            ))
            .await?;

        info!(
            "SLA tracking started for ticket {} (response due {}, resolution due {})",
            ticket_id, tracking.response_due, tracking.resolution_due
        );

        Ok(InitializeOutcome::Tracked(tracking))
    }

    /// Re-evaluate one tracking row against the calendar snapshot.
    /// Returns None when the referenced rule no longer exists.
    pub async fn evaluate(
        &self,
        tracking: &TicketSlaTracking,
        calendar: &WorkingCalendar,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<Evaluation>> {
        let rule = match self.sla_repo.get_sla_rule(&tracking.rule_id).await? {
            Some(rule) => rule,
            None => {
                warn!(
                    "Tracking {} references missing rule {}; skipping",
                    tracking.id, tracking.rule_id
                );
                return Ok(None);
            }
        };

        let started_at = parse_instant(&tracking.started_at)?;
        let budget_minutes = rule.resolution_budget_minutes();
        if budget_minutes <= 0 {
            warn!("Rule {} has a non-positive resolution budget; skipping", rule.id);
            return Ok(None);
        }

        let calc = DueTimeCalculator::new(calendar);
        let elapsed = calc.working_minutes_between(started_at, now);
        let percent = ((elapsed as f64 / budget_minutes as f64) * 100.0).clamp(0.0, 100.0);

        // Severity never moves backward within a lifecycle; only an explicit
        // re-initialization (reopen) resets it.
        let mapped = SlaStatus::from_percent(percent);
        let status = if mapped.severity() >= tracking.current_status.severity() {
            mapped
        } else {
            tracking.current_status
        };
        let status_changed = status != tracking.current_status;

        let response_breached = tracking.response_breached
            || (tracking.response_completed_at.is_none()
                && now > parse_instant(&tracking.response_due)?);
        let resolution_breached = tracking.resolution_breached
            || (tracking.resolution_completed_at.is_none()
                && now > parse_instant(&tracking.resolution_due)?);

        let dirty = status_changed
            || (percent - tracking.percent_consumed).abs() > f64::EPSILON
            || response_breached != tracking.response_breached
            || resolution_breached != tracking.resolution_breached;

        if dirty {
            self.sla_repo
                .update_tracking_evaluation(
                    &tracking.id,
                    status,
                    percent,
                    response_breached,
                    resolution_breached,
                )
                .await?;
        }

        if status_changed {
            self.sla_repo
                .append_ticket_event(&TicketEvent::new(
                    tracking.ticket_id.clone(),
                    TicketEventType::SlaStatusChanged,
                    json!({
                        "tracking_id": tracking.id,
                        "old_status": tracking.current_status.to_string(),
                        "new_status": status.to_string(),
                        "percent_consumed": percent,
                    }),
                ))
                .await?;

            self.event_bus.publish(SystemEvent::SlaStatusChanged {
                ticket_id: tracking.ticket_id.clone(),
                tracking_id: tracking.id.clone(),
                old_status: tracking.current_status,
                new_status: status,
                percent_consumed: percent,
                timestamp: now.to_rfc3339(),
            });

            info!(
                "Ticket {} SLA status {} -> {} ({:.1}% consumed)",
                tracking.ticket_id, tracking.current_status, status, percent
            );
        }

        Ok(Some(Evaluation {
            percent_consumed: percent,
            status,
            status_changed,
        }))
    }

    /// Record the first agent response; idempotent once set.
    pub async fn record_first_response(&self, ticket_id: &str, at: &str) -> EngineResult<()> {
        let tracking = match self.sla_repo.get_tracking_by_ticket(ticket_id).await? {
            Some(t) => t,
            None => return Ok(()), // ticket has no SLA
        };

        if tracking.response_completed_at.is_some() {
            return Ok(());
        }

        let breached = parse_instant(at)? > parse_instant(&tracking.response_due)?;
        self.sla_repo
            .set_tracking_response_completed(&tracking.id, at, breached)
            .await?;

        info!(
            "First response recorded for ticket {} at {} (breached: {})",
            ticket_id, at, breached
        );
        Ok(())
    }

    /// Record resolution completion; stops further evaluation of the row.
    pub async fn record_resolution(&self, ticket_id: &str, at: &str) -> EngineResult<()> {
        let tracking = match self.sla_repo.get_tracking_by_ticket(ticket_id).await? {
            Some(t) => t,
            None => return Ok(()),
        };

        if tracking.resolution_completed_at.is_some() {
            return Ok(());
        }

        let breached = parse_instant(at)? > parse_instant(&tracking.resolution_due)?;
        self.sla_repo
            .set_tracking_resolution_completed(&tracking.id, at, breached)
            .await?;

        info!(
            "Resolution recorded for ticket {} at {} (breached: {})",
            ticket_id, at, breached
        );
        Ok(())
    }

    // ========================================
    // Dashboard queries
    // ========================================

    /// Current SLA state for one ticket, if it is tracked.
    pub async fn status_for_ticket(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Option<TicketSlaTracking>> {
        self.sla_repo.get_tracking_by_ticket(ticket_id).await
    }

    /// All trackings currently in breach.
    pub async fn breached_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>> {
        self.sla_repo.list_breached_trackings().await
    }

    /// Escalation audit history for one ticket, ascending by level.
    pub async fn escalation_history(&self, ticket_id: &str) -> EngineResult<Vec<SlaEscalation>> {
        self.sla_repo.list_escalations_by_ticket(ticket_id).await
    }
}

/// Parse an RFC3339 timestamp persisted by the engine.
pub(crate) fn parse_instant(value: &str) -> EngineResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::Internal(format!("Invalid stored timestamp {}: {}", value, e)))
}
