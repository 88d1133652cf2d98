use serde::{Deserialize, Serialize};

// ===== Ticket SLA Tracking =====

/// One row per ticket (unique on ticket_id); created at ticket creation,
/// mutated only by the evaluation loop and the completion hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSlaTracking {
    pub id: String,
    pub ticket_id: String,
    pub policy_id: String,
    pub rule_id: String,
    pub response_due: String,
    pub response_completed_at: Option<String>,
    pub response_breached: bool,
    pub resolution_due: String,
    pub resolution_completed_at: Option<String>,
    pub resolution_breached: bool,
    pub current_status: SlaStatus,
    pub percent_consumed: f64,
    pub started_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TicketSlaTracking {
    pub fn new(
        ticket_id: String,
        policy_id: String,
        rule_id: String,
        response_due: String,
        resolution_due: String,
        started_at: String,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ticket_id,
            policy_id,
            rule_id,
            response_due,
            response_completed_at: None,
            response_breached: false,
            resolution_due,
            resolution_completed_at: None,
            resolution_breached: false,
            current_status: SlaStatus::Compliant,
            percent_consumed: 0.0,
            started_at,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    Compliant,
    AtRisk,
    Breached,
}

impl SlaStatus {
    /// Severity rank; status must never move backward within a lifecycle.
    pub fn severity(&self) -> u8 {
        match self {
            SlaStatus::Compliant => 0,
            SlaStatus::AtRisk => 1,
            SlaStatus::Breached => 2,
        }
    }

    /// Map percent-of-budget-consumed to a status.
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            SlaStatus::Breached
        } else if percent >= 75.0 {
            SlaStatus::AtRisk
        } else {
            SlaStatus::Compliant
        }
    }
}

impl std::fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlaStatus::Compliant => write!(f, "compliant"),
            SlaStatus::AtRisk => write!(f, "at_risk"),
            SlaStatus::Breached => write!(f, "breached"),
        }
    }
}

impl std::str::FromStr for SlaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compliant" => Ok(SlaStatus::Compliant),
            "at_risk" => Ok(SlaStatus::AtRisk),
            "breached" => Ok(SlaStatus::Breached),
            _ => Err(format!("Invalid SLA status: {}", s)),
        }
    }
}
