use serde::{Deserialize, Serialize};
use serde_json::Value;

// ===== Ticket Event =====

/// Structured append-only history entry for a ticket. Rows are written once
/// and queried directly; payloads are typed JSON per event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketEvent {
    pub id: String,
    pub ticket_id: String,
    pub event_type: TicketEventType,
    pub payload: Value,
    pub created_at: String,
}

impl TicketEvent {
    pub fn new(ticket_id: String, event_type: TicketEventType, payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ticket_id,
            event_type,
            payload,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketEventType {
    SlaStarted,
    SlaStatusChanged,
    EscalationFired,
    TicketReassigned,
    TicketAutoClosed,
}

impl std::fmt::Display for TicketEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketEventType::SlaStarted => write!(f, "sla_started"),
            TicketEventType::SlaStatusChanged => write!(f, "sla_status_changed"),
            TicketEventType::EscalationFired => write!(f, "escalation_fired"),
            TicketEventType::TicketReassigned => write!(f, "ticket_reassigned"),
            TicketEventType::TicketAutoClosed => write!(f, "ticket_auto_closed"),
        }
    }
}

impl std::str::FromStr for TicketEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sla_started" => Ok(TicketEventType::SlaStarted),
            "sla_status_changed" => Ok(TicketEventType::SlaStatusChanged),
            "escalation_fired" => Ok(TicketEventType::EscalationFired),
            "ticket_reassigned" => Ok(TicketEventType::TicketReassigned),
            "ticket_auto_closed" => Ok(TicketEventType::TicketAutoClosed),
            _ => Err(format!("Invalid ticket event type: {}", s)),
        }
    }
}
