use serde::{Deserialize, Serialize};

// ===== Ticket (external view) =====

/// Read-model of a ticket as the engine sees it. Ticket CRUD and ownership
/// live elsewhere; the engine only reads these fields and writes `sla_due`
/// and `assigned_user_id` (on escalation reassignment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub priority: String,
    pub status: TicketStatus,
    pub assigned_user_id: Option<String>,
    pub sla_due: Option<String>,
    pub responded_at: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        !matches!(self.status, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::InProgress => write!(f, "in_progress"),
            TicketStatus::Resolved => write!(f, "resolved"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(format!("Invalid ticket status: {}", s)),
        }
    }
}

// ===== User (external view) =====

/// Minimal user read-model for escalation targets and manager fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}
