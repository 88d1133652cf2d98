use serde::{Deserialize, Serialize};

/// In-app notification row written by the engine's dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: String,
}

impl Notification {
    pub fn new(user_id: String, title: String, message: String, link: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title,
            message,
            link,
            read: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
