#![allow(dead_code)]
use chrono::{DateTime, Utc};
use slawatch::domain::ports::{
    AssignmentWorkload, NotificationDispatcher, NotificationRepository, SlaRepository, TicketStore,
};
use slawatch::events::EventBus;
use slawatch::infrastructure::persistence::Database;
use slawatch::models::{
    Holiday, SlaEscalationRule, SlaPolicy, SlaRule, Ticket, TicketSlaTracking, TicketStatus,
};
use slawatch::services::{EscalationEngine, NotificationService, TrackingService};
use std::sync::Arc;

/// Create an active policy with no rules attached yet.
pub async fn create_test_policy(db: &Database, name: &str) -> SlaPolicy {
    let policy = SlaPolicy::new(name.to_string(), Some(format!("Test policy: {}", name)));
    db.create_sla_policy(&policy)
        .await
        .expect("Failed to create SLA policy");
    policy
}

pub async fn create_test_rule(
    db: &Database,
    policy_id: &str,
    priority: &str,
    response_minutes: i64,
    resolution_hours: i64,
) -> SlaRule {
    let rule = SlaRule::new(
        policy_id.to_string(),
        priority.to_string(),
        response_minutes,
        resolution_hours,
        80,
    );
    db.create_sla_rule(&rule)
        .await
        .expect("Failed to create SLA rule");
    rule
}

pub async fn create_escalation_tier(
    db: &Database,
    policy_id: &str,
    level: i64,
    trigger_percent: i64,
) -> SlaEscalationRule {
    let rule = SlaEscalationRule::new(policy_id.to_string(), level, trigger_percent);
    db.create_escalation_rule(&rule)
        .await
        .expect("Failed to create escalation rule");
    rule
}

pub async fn create_test_holiday(db: &Database, name: &str, date: &str, recurring: bool) {
    let holiday = Holiday::new(name.to_string(), date.to_string(), recurring);
    db.create_holiday(&holiday)
        .await
        .expect("Failed to create holiday");
}

pub async fn create_test_ticket(db: &Database, subject: &str, priority: &str) -> Ticket {
    let now = Utc::now().to_rfc3339();
    let ticket = Ticket {
        id: uuid::Uuid::new_v4().to_string(),
        subject: subject.to_string(),
        priority: priority.to_string(),
        status: TicketStatus::Open,
        assigned_user_id: None,
        sla_due: None,
        responded_at: None,
        resolved_at: None,
        created_at: now.clone(),
        updated_at: now,
    };
    db.create_ticket(&ticket)
        .await
        .expect("Failed to create ticket");
    ticket
}

pub async fn create_test_user(db: &Database, name: &str, role: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (id, name, email, role, is_active, workload, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(format!("{}@example.com", id))
    .bind(role)
    .bind(true)
    .bind(&now)
    .bind(&now)
    .execute(db.pool())
    .await
    .expect("Failed to create user");
    id
}

pub async fn assign_ticket(db: &Database, ticket_id: &str, user_id: &str) {
    TicketStore::set_assignee(db, ticket_id, user_id)
        .await
        .expect("Failed to assign ticket");
}

pub async fn mark_resolved(db: &Database, ticket_id: &str, resolved_at: &str) {
    sqlx::query("UPDATE tickets SET status = 'resolved', resolved_at = ? WHERE id = ?")
        .bind(resolved_at)
        .bind(ticket_id)
        .execute(db.pool())
        .await
        .expect("Failed to resolve ticket");
}

/// Insert a tracking row with an explicit start instant, bypassing the
/// service, so evaluation math can be pinned to fixed timestamps.
pub async fn insert_tracking_started_at(
    db: &Database,
    ticket_id: &str,
    policy_id: &str,
    rule_id: &str,
    started_at: DateTime<Utc>,
    response_due: DateTime<Utc>,
    resolution_due: DateTime<Utc>,
) -> TicketSlaTracking {
    let tracking = TicketSlaTracking::new(
        ticket_id.to_string(),
        policy_id.to_string(),
        rule_id.to_string(),
        response_due.to_rfc3339(),
        resolution_due.to_rfc3339(),
        started_at.to_rfc3339(),
    );
    db.upsert_tracking(&tracking)
        .await
        .expect("Failed to insert tracking");
    tracking
}

pub fn build_tracking_service(db: &Database) -> TrackingService {
    build_tracking_service_with_bus(db).0
}

pub fn build_tracking_service_with_bus(db: &Database) -> (TrackingService, Arc<EventBus>) {
    let event_bus = Arc::new(EventBus::new(100));
    let service = TrackingService::new(
        Arc::new(db.clone()) as Arc<dyn SlaRepository>,
        Arc::new(db.clone()) as Arc<dyn TicketStore>,
        event_bus.clone(),
    );
    (service, event_bus)
}

pub fn build_escalation_engine(db: &Database) -> EscalationEngine {
    let event_bus = Arc::new(EventBus::new(100));
    let notifier: Arc<dyn NotificationDispatcher> = Arc::new(NotificationService::new(
        Arc::new(db.clone()) as Arc<dyn NotificationRepository>,
    ));
    EscalationEngine::new(
        Arc::new(db.clone()) as Arc<dyn SlaRepository>,
        Arc::new(db.clone()) as Arc<dyn TicketStore>,
        Arc::new(db.clone()) as Arc<dyn AssignmentWorkload>,
        notifier,
        event_bus.clone(),
        event_bus,
    )
}
