use crate::domain::ports::{
    AssignmentWorkload, LiveUpdateBroadcaster, NotificationDispatcher, SlaRepository, TicketStore,
};
use crate::errors::EngineResult;
use crate::events::{EventBus, SystemEvent};
use crate::models::{
    SlaEscalation, SlaEscalationRule, TicketEvent, TicketEventType, TicketSlaTracking, UserRef,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Evaluates percent-consumed against ordered escalation tiers and fires
/// each (tracking, level) pair at most once: notification fan-out, optional
/// reassignment, and an append-only audit record.
#[derive(Clone)]
pub struct EscalationEngine {
    sla_repo: Arc<dyn SlaRepository>,
    ticket_store: Arc<dyn TicketStore>,
    workload: Arc<dyn AssignmentWorkload>,
    notifier: Arc<dyn NotificationDispatcher>,
    live: Arc<dyn LiveUpdateBroadcaster>,
    event_bus: Arc<EventBus>,
}

impl EscalationEngine {
    pub fn new(
        sla_repo: Arc<dyn SlaRepository>,
        ticket_store: Arc<dyn TicketStore>,
        workload: Arc<dyn AssignmentWorkload>,
        notifier: Arc<dyn NotificationDispatcher>,
        live: Arc<dyn LiveUpdateBroadcaster>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sla_repo,
            ticket_store,
            workload,
            notifier,
            live,
            event_bus,
        }
    }

    /// Walk the policy's tiers in ascending level order and fire every tier
    /// whose threshold is crossed and which has not fired before. Returns
    /// the number of tiers fired. Levels skipped by a long pause all fire in
    /// the same pass, lowest first.
    pub async fn run(
        &self,
        tracking: &TicketSlaTracking,
        percent: f64,
    ) -> EngineResult<u32> {
        let rules = self
            .sla_repo
            .list_escalation_rules(&tracking.policy_id)
            .await?;

        let mut fired = 0u32;
        for rule in rules {
            if percent < rule.trigger_percent as f64 {
                continue;
            }
            if self
                .sla_repo
                .escalation_exists(&tracking.id, rule.level)
                .await?
            {
                continue;
            }
            if self.fire(tracking, &rule, percent).await? {
                fired += 1;
            }
        }

        if fired > 0 {
            self.live.broadcast_dashboard_changed("sla_escalation");
        }

        Ok(fired)
    }

    /// Fire one tier. Returns false when a concurrent evaluator won the
    /// insert race; the loser performs no side effects.
    async fn fire(
        &self,
        tracking: &TicketSlaTracking,
        rule: &SlaEscalationRule,
        percent: f64,
    ) -> EngineResult<bool> {
        let escalation = SlaEscalation::new(
            tracking.id.clone(),
            tracking.ticket_id.clone(),
            rule.level,
            rule.trigger_percent,
            percent,
        );

        // Audit row goes in first: UNIQUE(tracking_id, level) makes the
        // decision exclusive even across concurrent scheduler instances.
        match self.sla_repo.insert_escalation(&escalation).await {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                info!(
                    "Escalation level {} already fired for tracking {}; skipping",
                    rule.level, tracking.id
                );
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        let ticket = match self.ticket_store.get_ticket(&tracking.ticket_id).await? {
            Some(ticket) => ticket,
            None => {
                warn!(
                    "Ticket {} vanished while escalating level {}",
                    tracking.ticket_id, rule.level
                );
                return Ok(true);
            }
        };

        // Reassignment failure degrades to "no reassignment", never skips
        // the notification fan-out.
        let reassigned_to = if rule.wants_reassignment() {
            match self.try_reassign(&ticket.id, ticket.assigned_user_id.as_deref(), rule).await {
                Ok(target) => target,
                Err(e) => {
                    error!(
                        "Reassignment failed for ticket {} at level {}: {}",
                        ticket.id, rule.level, e
                    );
                    None
                }
            }
        } else {
            None
        };

        let notified = self
            .notify_targets(&ticket.id, tracking, rule, reassigned_to.as_ref(), &ticket)
            .await;

        self.sla_repo
            .update_escalation_outcome(
                &escalation.id,
                reassigned_to.as_ref().map(|u| u.id.as_str()),
                &notified,
            )
            .await?;

        self.sla_repo
            .append_ticket_event(&TicketEvent::new(
                ticket.id.clone(),
                TicketEventType::EscalationFired,
                json!({
                    "tracking_id": tracking.id,
                    "level": rule.level,
                    "trigger_percent": rule.trigger_percent,
                    "percent_at_fire": percent,
                    "reassigned_to": reassigned_to.as_ref().map(|u| u.id.clone()),
                    "notified_user_ids": notified,
                }),
            ))
            .await?;

        self.event_bus.publish(SystemEvent::EscalationFired {
            ticket_id: ticket.id.clone(),
            tracking_id: tracking.id.clone(),
            level: rule.level,
            trigger_percent: rule.trigger_percent,
            reassigned_to: reassigned_to.as_ref().map(|u| u.id.clone()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });

        info!(
            "Escalation level {} fired for ticket {} at {:.1}% consumed",
            rule.level, ticket.id, percent
        );

        Ok(true)
    }

    /// Move the ticket to an active user of the tier's target role, unless
    /// the current assignee already holds it. Updates both workload counters.
    async fn try_reassign(
        &self,
        ticket_id: &str,
        current_assignee: Option<&str>,
        rule: &SlaEscalationRule,
    ) -> EngineResult<Option<UserRef>> {
        let role = rule.reassign_role();

        if let Some(assignee) = current_assignee {
            if self.workload.user_has_role(assignee, role).await? {
                return Ok(None);
            }
        }

        let target = match self.workload.find_active_user_by_role(role).await? {
            Some(user) => user,
            None => {
                warn!(
                    "No active user with role {:?} to escalate ticket {} to",
                    role, ticket_id
                );
                return Ok(None);
            }
        };

        self.ticket_store.set_assignee(ticket_id, &target.id).await?;

        if let Some(previous) = current_assignee {
            self.workload.adjust_workload(previous, -1).await?;
        }
        self.workload.adjust_workload(&target.id, 1).await?;

        self.sla_repo
            .append_ticket_event(&TicketEvent::new(
                ticket_id.to_string(),
                TicketEventType::TicketReassigned,
                json!({
                    "from": current_assignee,
                    "to": target.id,
                    "role": role,
                    "level": rule.level,
                }),
            ))
            .await?;

        info!(
            "Ticket {} reassigned to {} ({}) by escalation level {}",
            ticket_id, target.name, role, rule.level
        );

        Ok(Some(target))
    }

    /// In-app + email fan-out. Channel failures are logged and never unwind
    /// the audit insert or the reassignment. Returns the notified user ids.
    async fn notify_targets(
        &self,
        ticket_id: &str,
        tracking: &TicketSlaTracking,
        rule: &SlaEscalationRule,
        reassigned_to: Option<&UserRef>,
        ticket: &crate::models::Ticket,
    ) -> Vec<String> {
        let title = format!("SLA escalation (level {})", rule.level);
        let message = format!(
            "Ticket '{}' has consumed {}% of its resolution budget",
            ticket.subject, rule.trigger_percent
        );
        let link = format!("/tickets/{}", ticket_id);

        let mut targets: Vec<UserRef> = Vec::new();

        if rule.notify_assignee {
            // The technician just reassigned away is not notified; the new
            // assignee is.
            let assignee_id = match reassigned_to {
                Some(user) => Some(user.id.clone()),
                None => ticket.assigned_user_id.clone(),
            };
            if let Some(id) = assignee_id {
                match self.workload.get_user(&id).await {
                    Ok(Some(user)) => targets.push(user),
                    Ok(None) => warn!("Assignee {} not found for escalation notify", id),
                    Err(e) => error!("Assignee lookup failed for {}: {}", id, e),
                }
            }
        }

        if rule.notify_managers {
            match self.workload.list_active_users_by_role("manager").await {
                Ok(managers) => targets.extend(managers),
                Err(e) => error!("Manager lookup failed: {}", e),
            }
        }

        let mut notified: Vec<String> = Vec::new();
        for user in targets {
            if notified.contains(&user.id) {
                continue;
            }
            if let Err(e) = self.notifier.notify(&user.id, &title, &message, &link).await {
                error!("In-app notification to {} failed: {}", user.id, e);
                continue;
            }
            if let Err(e) = self
                .notifier
                .send_escalation_email(&user.email, ticket, rule.level, rule.trigger_percent)
                .await
            {
                error!("Escalation email to {} failed: {}", user.email, e);
            }
            notified.push(user.id);
        }

        if notified.is_empty() {
            warn!(
                "Escalation level {} for tracking {} notified nobody",
                rule.level, tracking.id
            );
        }

        notified
    }
}
