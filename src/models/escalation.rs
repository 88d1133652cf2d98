use serde::{Deserialize, Serialize};

// ===== Escalation Rule =====

/// A notification/reassignment tier for a policy. Levels are small positive
/// integers, conventionally 1=warning, 2=critical, 3=breach (100%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaEscalationRule {
    pub id: String,
    pub policy_id: String,
    pub level: i64,
    pub trigger_percent: i64,
    pub notify_assignee: bool,
    pub notify_managers: bool,
    /// When set, fire reassigns the ticket to an active user of this role.
    pub auto_reassign_role: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SlaEscalationRule {
    pub fn new(policy_id: String, level: i64, trigger_percent: i64) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            policy_id,
            level,
            trigger_percent,
            notify_assignee: true,
            notify_managers: true,
            auto_reassign_role: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Level 2 and above reassigns even without an explicit role override.
    pub fn wants_reassignment(&self) -> bool {
        self.level >= 2 || self.auto_reassign_role.is_some()
    }

    /// Role to reassign to when this tier fires.
    pub fn reassign_role(&self) -> &str {
        self.auto_reassign_role.as_deref().unwrap_or("manager")
    }
}

// ===== Escalation Audit Record =====

/// Append-only audit record; UNIQUE(tracking_id, level) guarantees the same
/// level never fires twice for one tracking row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaEscalation {
    pub id: String,
    pub tracking_id: String,
    pub ticket_id: String,
    pub level: i64,
    pub trigger_percent: i64,
    pub percent_at_fire: f64,
    pub reassigned_to: Option<String>,
    /// User ids notified when this tier fired, stored as a JSON array.
    pub notified_user_ids: Vec<String>,
    pub fired_at: String,
}

impl SlaEscalation {
    pub fn new(
        tracking_id: String,
        ticket_id: String,
        level: i64,
        trigger_percent: i64,
        percent_at_fire: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracking_id,
            ticket_id,
            level,
            trigger_percent,
            percent_at_fire,
            reassigned_to: None,
            notified_user_ids: Vec::new(),
            fired_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
