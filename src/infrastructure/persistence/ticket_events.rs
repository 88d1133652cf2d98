use crate::errors::{EngineError, EngineResult};
use crate::infrastructure::persistence::Database;
use crate::models::{TicketEvent, TicketEventType};
use sqlx::Row;

impl Database {
    /// Rows are written once and never updated.
    pub async fn append_ticket_event(&self, event: &TicketEvent) -> EngineResult<()> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| EngineError::Internal(format!("Event payload serialization: {}", e)))?;

        sqlx::query(
            "INSERT INTO ticket_events (id, ticket_id, event_type, payload, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(&event.ticket_id)
        .bind(event.event_type.to_string())
        .bind(payload)
        .bind(&event.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn list_ticket_events(&self, ticket_id: &str) -> EngineResult<Vec<TicketEvent>> {
        let rows = sqlx::query(
            "SELECT id, ticket_id, event_type, payload, created_at
             FROM ticket_events WHERE ticket_id = ? ORDER BY created_at ASC",
        )
        .bind(ticket_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                let event_type_str: String = row.try_get("event_type")?;
                let payload_str: String = row.try_get("payload")?;

                Ok(TicketEvent {
                    id: row.try_get("id")?,
                    ticket_id: row.try_get("ticket_id")?,
                    event_type: event_type_str.parse::<TicketEventType>().map_err(|e| {
                        EngineError::Internal(format!("Column decode error: {}", e))
                    })?,
                    payload: serde_json::from_str(&payload_str)
                        .unwrap_or(serde_json::Value::Null),
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
