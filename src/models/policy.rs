use serde::{Deserialize, Serialize};

// ===== SLA Policy =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaPolicy {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub business_hours_mode: BusinessHoursMode,
    /// Working days as weekday names, e.g. ["Monday", ..., "Saturday"].
    pub working_days: Vec<String>,
    pub activated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SlaPolicy {
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            is_active: true,
            business_hours_mode: BusinessHoursMode::AlwaysOn,
            working_days: default_working_days(),
            activated_at: Some(now.clone()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Every weekday except Sunday, the conventional non-working day.
pub fn default_working_days() -> Vec<String> {
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessHoursMode {
    /// 24/7 minus non-working days (the only mode the calendar implements).
    AlwaysOn,
    /// Windowed business hours; reserved, treated as AlwaysOn today.
    Windowed,
}

impl std::fmt::Display for BusinessHoursMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusinessHoursMode::AlwaysOn => write!(f, "always_on"),
            BusinessHoursMode::Windowed => write!(f, "windowed"),
        }
    }
}

impl std::str::FromStr for BusinessHoursMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always_on" => Ok(BusinessHoursMode::AlwaysOn),
            "windowed" => Ok(BusinessHoursMode::Windowed),
            _ => Err(format!("Invalid business hours mode: {}", s)),
        }
    }
}

// ===== SLA Rule =====

/// Per-priority time budgets for a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaRule {
    pub id: String,
    pub policy_id: String,
    /// Priority label the rule matches, e.g. "Critical", "High", "Medium", "Low".
    pub priority: String,
    pub response_time_minutes: i64,
    pub resolution_time_hours: i64,
    /// Percent consumed at which the first escalation tier should trigger.
    pub escalate_at_percent: i64,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl SlaRule {
    pub fn new(
        policy_id: String,
        priority: String,
        response_time_minutes: i64,
        resolution_time_hours: i64,
        escalate_at_percent: i64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            policy_id,
            priority,
            response_time_minutes,
            resolution_time_hours,
            escalate_at_percent,
            enabled: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Resolution budget expressed in working minutes.
    pub fn resolution_budget_minutes(&self) -> i64 {
        self.resolution_time_hours * 60
    }
}

// ===== Priority normalization =====

/// Capitalize the first letter of a priority label ("critical" -> "Critical").
pub fn capitalize_priority(priority: &str) -> String {
    let mut chars = priority.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Map synonym labels onto the canonical priority set.
/// Unknown labels pass through unchanged and fall back at resolution time.
pub fn normalize_priority(priority: &str) -> String {
    let capitalized = capitalize_priority(priority.trim());
    match capitalized.as_str() {
        "Normal" => "Medium".to_string(),
        _ => capitalized,
    }
}
