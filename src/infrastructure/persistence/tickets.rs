use crate::errors::EngineResult;
use crate::infrastructure::persistence::Database;
use crate::models::{Ticket, TicketStatus};
use sqlx::Row;

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

impl Database {
    pub async fn create_ticket(&self, ticket: &Ticket) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO tickets (id, subject, priority, status, assigned_user_id, sla_due, responded_at, resolved_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&ticket.id)
        .bind(&ticket.subject)
        .bind(&ticket.priority)
        .bind(ticket.status.to_string())
        .bind(&ticket.assigned_user_id)
        .bind(&ticket.sla_due)
        .bind(&ticket.responded_at)
        .bind(&ticket.resolved_at)
        .bind(&ticket.created_at)
        .bind(&ticket.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn get_ticket(&self, id: &str) -> EngineResult<Option<Ticket>> {
        let row = sqlx::query(
            "SELECT id, subject, priority, status, assigned_user_id, sla_due, responded_at, resolved_at, created_at, updated_at
             FROM tickets WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(ticket_from_row).transpose()
    }

    pub async fn open_ticket_ids(&self) -> EngineResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT id FROM tickets WHERE status NOT IN ('resolved', 'closed') ORDER BY created_at ASC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| Ok(row.try_get("id")?))
            .collect()
    }

    pub async fn set_ticket_sla_due(&self, id: &str, due_at: &str) -> EngineResult<()> {
        sqlx::query("UPDATE tickets SET sla_due = ?, updated_at = ? WHERE id = ?")
            .bind(due_at)
            .bind(now_rfc3339())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    pub async fn set_ticket_assignee(&self, id: &str, user_id: &str) -> EngineResult<()> {
        sqlx::query("UPDATE tickets SET assigned_user_id = ?, updated_at = ? WHERE id = ?")
            .bind(user_id)
            .bind(now_rfc3339())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    pub async fn tickets_resolved_before(&self, cutoff: &str) -> EngineResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT id FROM tickets
             WHERE status = 'resolved' AND resolved_at IS NOT NULL AND resolved_at < ?
             ORDER BY resolved_at ASC",
        )
        .bind(cutoff)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| Ok(row.try_get("id")?))
            .collect()
    }

    pub async fn close_ticket(&self, id: &str) -> EngineResult<()> {
        sqlx::query("UPDATE tickets SET status = 'closed', updated_at = ? WHERE id = ?")
            .bind(now_rfc3339())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}

fn ticket_from_row(row: sqlx::any::AnyRow) -> EngineResult<Ticket> {
    let status_str: String = row.try_get("status")?;
    let status = status_str.parse::<TicketStatus>().map_err(|e| {
        crate::errors::EngineError::Internal(format!("Column decode error: {}", e))
    })?;

    Ok(Ticket {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        priority: row.try_get("priority")?,
        status,
        assigned_user_id: row
            .try_get::<Option<String>, _>("assigned_user_id")
            .ok()
            .flatten(),
        sla_due: row.try_get::<Option<String>, _>("sla_due").ok().flatten(),
        responded_at: row
            .try_get::<Option<String>, _>("responded_at")
            .ok()
            .flatten(),
        resolved_at: row
            .try_get::<Option<String>, _>("resolved_at")
            .ok()
            .flatten(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// Implement TicketStore trait for Database
#[async_trait::async_trait]
impl crate::domain::ports::TicketStore for Database {
    async fn get_ticket(&self, ticket_id: &str) -> EngineResult<Option<Ticket>> {
        self.get_ticket(ticket_id).await
    }

    async fn open_ticket_ids(&self) -> EngineResult<Vec<String>> {
        self.open_ticket_ids().await
    }

    async fn set_sla_due(&self, ticket_id: &str, due_at: &str) -> EngineResult<()> {
        self.set_ticket_sla_due(ticket_id, due_at).await
    }

    async fn set_assignee(&self, ticket_id: &str, user_id: &str) -> EngineResult<()> {
        self.set_ticket_assignee(ticket_id, user_id).await
    }

    async fn resolved_before(&self, cutoff: &str) -> EngineResult<Vec<String>> {
        self.tickets_resolved_before(cutoff).await
    }

    async fn close_ticket(&self, ticket_id: &str) -> EngineResult<()> {
        self.close_ticket(ticket_id).await
    }
}
