use serde::{Deserialize, Serialize};

/// Holiday calendar entry excluded from working-time arithmetic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub id: String,
    pub name: String,
    pub date: String, // Date in YYYY-MM-DD format
    pub recurring: bool, // If true, repeats annually on same month-day
    pub created_at: String,
    pub updated_at: String,
}

impl Holiday {
    pub fn new(name: String, date: String, recurring: bool) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            date,
            recurring,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
