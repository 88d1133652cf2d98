use crate::errors::{EngineError, EngineResult};
use crate::infrastructure::persistence::Database;
use crate::models::{
    BusinessHoursMode, SlaEscalation, SlaEscalationRule, SlaPolicy, SlaRule, SlaStatus,
    TicketSlaTracking,
};
use sqlx::Row;
use time;

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

fn decode_err(e: String) -> EngineError {
    EngineError::Internal(format!("Column decode error: {}", e))
}

impl Database {
    // ========================================
    // SLA Policy Operations
    // ========================================

    pub async fn create_sla_policy(&self, policy: &SlaPolicy) -> EngineResult<()> {
        let working_days =
            serde_json::to_string(&policy.working_days).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            "INSERT INTO sla_policies (id, name, description, is_active, business_hours_mode, working_days, activated_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&policy.id)
        .bind(&policy.name)
        .bind(&policy.description)
        .bind(policy.is_active)
        .bind(policy.business_hours_mode.to_string())
        .bind(working_days)
        .bind(&policy.activated_at)
        .bind(&policy.created_at)
        .bind(&policy.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn get_sla_policy(&self, id: &str) -> EngineResult<Option<SlaPolicy>> {
        let row = sqlx::query(
            "SELECT id, name, description, is_active, business_hours_mode, working_days, activated_at, created_at, updated_at
             FROM sla_policies WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(policy_from_row).transpose()
    }

    /// The single policy consulted for resolution. When multiple rows are
    /// active the most recently activated wins.
    pub async fn get_active_sla_policy(&self) -> EngineResult<Option<SlaPolicy>> {
        let row = sqlx::query(
            "SELECT id, name, description, is_active, business_hours_mode, working_days, activated_at, created_at, updated_at
             FROM sla_policies WHERE is_active = ?
             ORDER BY activated_at DESC LIMIT 1"
        )
        .bind(true)
        .fetch_optional(self.pool())
        .await?;

        row.map(policy_from_row).transpose()
    }

    pub async fn set_sla_policy_active(&self, id: &str, active: bool) -> EngineResult<()> {
        let now = now_rfc3339();
        let activated_at = if active { Some(now.clone()) } else { None };

        sqlx::query(
            "UPDATE sla_policies SET is_active = ?, activated_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(active)
        .bind(activated_at)
        .bind(&now)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // ========================================
    // SLA Rule Operations
    // ========================================

    pub async fn create_sla_rule(&self, rule: &SlaRule) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO sla_rules (id, policy_id, priority, response_time_minutes, resolution_time_hours, escalate_at_percent, enabled, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&rule.id)
        .bind(&rule.policy_id)
        .bind(&rule.priority)
        .bind(rule.response_time_minutes)
        .bind(rule.resolution_time_hours)
        .bind(rule.escalate_at_percent)
        .bind(rule.enabled)
        .bind(&rule.created_at)
        .bind(&rule.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Exact-label match; several enabled rows for one priority resolve
    /// deterministically to the lowest id.
    pub async fn get_enabled_rule(
        &self,
        policy_id: &str,
        priority: &str,
    ) -> EngineResult<Option<SlaRule>> {
        let row = sqlx::query(
            "SELECT id, policy_id, priority, response_time_minutes, resolution_time_hours, escalate_at_percent, enabled, created_at, updated_at
             FROM sla_rules WHERE policy_id = ? AND priority = ? AND enabled = ?
             ORDER BY id ASC LIMIT 1"
        )
        .bind(policy_id)
        .bind(priority)
        .bind(true)
        .fetch_optional(self.pool())
        .await?;

        row.map(rule_from_row).transpose()
    }

    pub async fn get_sla_rule(&self, id: &str) -> EngineResult<Option<SlaRule>> {
        let row = sqlx::query(
            "SELECT id, policy_id, priority, response_time_minutes, resolution_time_hours, escalate_at_percent, enabled, created_at, updated_at
             FROM sla_rules WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(rule_from_row).transpose()
    }

    // ========================================
    // Tracking Operations
    // ========================================

    /// Create or overwrite the tracking row for a ticket (re-initialization
    /// on reopen replaces the old row wholesale).
    pub async fn upsert_tracking(&self, tracking: &TicketSlaTracking) -> EngineResult<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM ticket_sla_trackings WHERE ticket_id = ?")
            .bind(&tracking.ticket_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO ticket_sla_trackings (id, ticket_id, policy_id, rule_id, response_due, response_completed_at, response_breached, resolution_due, resolution_completed_at, resolution_breached, current_status, percent_consumed, started_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&tracking.id)
        .bind(&tracking.ticket_id)
        .bind(&tracking.policy_id)
        .bind(&tracking.rule_id)
        .bind(&tracking.response_due)
        .bind(&tracking.response_completed_at)
        .bind(tracking.response_breached)
        .bind(&tracking.resolution_due)
        .bind(&tracking.resolution_completed_at)
        .bind(tracking.resolution_breached)
        .bind(tracking.current_status.to_string())
        .bind(tracking.percent_consumed)
        .bind(&tracking.started_at)
        .bind(&tracking.created_at)
        .bind(&tracking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_tracking_by_ticket(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Option<TicketSlaTracking>> {
        let row = sqlx::query(
            "SELECT id, ticket_id, policy_id, rule_id, response_due, response_completed_at, response_breached, resolution_due, resolution_completed_at, resolution_breached, current_status, percent_consumed, started_at, created_at, updated_at
             FROM ticket_sla_trackings WHERE ticket_id = ?"
        )
        .bind(ticket_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(tracking_from_row).transpose()
    }

    /// Trackings still in play: ticket not resolved/closed and resolution
    /// not completed.
    pub async fn list_open_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>> {
        let rows = sqlx::query(
            "SELECT t.id, t.ticket_id, t.policy_id, t.rule_id, t.response_due, t.response_completed_at, t.response_breached, t.resolution_due, t.resolution_completed_at, t.resolution_breached, t.current_status, t.percent_consumed, t.started_at, t.created_at, t.updated_at
             FROM ticket_sla_trackings t
             JOIN tickets tk ON tk.id = t.ticket_id
             WHERE t.resolution_completed_at IS NULL
               AND tk.status NOT IN ('resolved', 'closed')
             ORDER BY t.started_at ASC"
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(tracking_from_row).collect()
    }

    pub async fn list_breached_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>> {
        let rows = sqlx::query(
            "SELECT id, ticket_id, policy_id, rule_id, response_due, response_completed_at, response_breached, resolution_due, resolution_completed_at, resolution_breached, current_status, percent_consumed, started_at, created_at, updated_at
             FROM ticket_sla_trackings WHERE current_status = 'breached'
             ORDER BY started_at ASC"
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(tracking_from_row).collect()
    }

    pub async fn update_tracking_evaluation(
        &self,
        tracking_id: &str,
        status: SlaStatus,
        percent_consumed: f64,
        response_breached: bool,
        resolution_breached: bool,
    ) -> EngineResult<()> {
        sqlx::query(
            "UPDATE ticket_sla_trackings
             SET current_status = ?, percent_consumed = ?, response_breached = ?, resolution_breached = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(status.to_string())
        .bind(percent_consumed)
        .bind(response_breached)
        .bind(resolution_breached)
        .bind(now_rfc3339())
        .bind(tracking_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn set_tracking_response_completed(
        &self,
        tracking_id: &str,
        completed_at: &str,
        breached: bool,
    ) -> EngineResult<()> {
        sqlx::query(
            "UPDATE ticket_sla_trackings
             SET response_completed_at = ?, response_breached = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(completed_at)
        .bind(breached)
        .bind(now_rfc3339())
        .bind(tracking_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn set_tracking_resolution_completed(
        &self,
        tracking_id: &str,
        completed_at: &str,
        breached: bool,
    ) -> EngineResult<()> {
        sqlx::query(
            "UPDATE ticket_sla_trackings
             SET resolution_completed_at = ?, resolution_breached = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(completed_at)
        .bind(breached)
        .bind(now_rfc3339())
        .bind(tracking_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // ========================================
    // Escalation Rule Operations
    // ========================================

    pub async fn create_escalation_rule(&self, rule: &SlaEscalationRule) -> EngineResult<()> {
        sqlx::query(
            "INSERT INTO sla_escalation_rules (id, policy_id, level, trigger_percent, notify_assignee, notify_managers, auto_reassign_role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&rule.id)
        .bind(&rule.policy_id)
        .bind(rule.level)
        .bind(rule.trigger_percent)
        .bind(rule.notify_assignee)
        .bind(rule.notify_managers)
        .bind(&rule.auto_reassign_role)
        .bind(&rule.created_at)
        .bind(&rule.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Tiers ascending by level so lower levels always fire (and audit)
    /// before higher ones within a pass.
    pub async fn list_escalation_rules(
        &self,
        policy_id: &str,
    ) -> EngineResult<Vec<SlaEscalationRule>> {
        let rows = sqlx::query(
            "SELECT id, policy_id, level, trigger_percent, notify_assignee, notify_managers, auto_reassign_role, created_at, updated_at
             FROM sla_escalation_rules WHERE policy_id = ?
             ORDER BY level ASC"
        )
        .bind(policy_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(escalation_rule_from_row).collect()
    }

    // ========================================
    // Escalation Audit Operations
    // ========================================

    pub async fn escalation_exists(&self, tracking_id: &str, level: i64) -> EngineResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sla_escalations WHERE tracking_id = ? AND level = ?",
        )
        .bind(tracking_id)
        .bind(level)
        .fetch_one(self.pool())
        .await?;

        Ok(count > 0)
    }

    /// Honors UNIQUE(tracking_id, level); a lost race surfaces as Conflict.
    pub async fn insert_escalation(&self, escalation: &SlaEscalation) -> EngineResult<()> {
        let notified = serde_json::to_string(&escalation.notified_user_ids)
            .unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            "INSERT INTO sla_escalations (id, tracking_id, ticket_id, level, trigger_percent, percent_at_fire, reassigned_to, notified_user_ids, fired_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&escalation.id)
        .bind(&escalation.tracking_id)
        .bind(&escalation.ticket_id)
        .bind(escalation.level)
        .bind(escalation.trigger_percent)
        .bind(escalation.percent_at_fire)
        .bind(&escalation.reassigned_to)
        .bind(notified)
        .bind(&escalation.fired_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn update_escalation_outcome(
        &self,
        escalation_id: &str,
        reassigned_to: Option<&str>,
        notified_user_ids: &[String],
    ) -> EngineResult<()> {
        let notified =
            serde_json::to_string(notified_user_ids).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            "UPDATE sla_escalations SET reassigned_to = ?, notified_user_ids = ? WHERE id = ?",
        )
        .bind(reassigned_to)
        .bind(notified)
        .bind(escalation_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn list_escalations_by_ticket(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Vec<SlaEscalation>> {
        let rows = sqlx::query(
            "SELECT id, tracking_id, ticket_id, level, trigger_percent, percent_at_fire, reassigned_to, notified_user_ids, fired_at
             FROM sla_escalations WHERE ticket_id = ?
             ORDER BY level ASC"
        )
        .bind(ticket_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(escalation_from_row).collect()
    }
}

// ========================================
// Row mapping
// ========================================

fn policy_from_row(row: sqlx::any::AnyRow) -> EngineResult<SlaPolicy> {
    let mode_str: String = row.try_get("business_hours_mode")?;
    let working_days_str: String = row.try_get("working_days")?;
    let working_days: Vec<String> = serde_json::from_str(&working_days_str).unwrap_or_default();

    Ok(SlaPolicy {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row
            .try_get::<Option<String>, _>("description")
            .ok()
            .flatten(),
        is_active: row.try_get::<i64, _>("is_active")? != 0,
        business_hours_mode: mode_str
            .parse::<BusinessHoursMode>()
            .map_err(decode_err)?,
        working_days,
        activated_at: row
            .try_get::<Option<String>, _>("activated_at")
            .ok()
            .flatten(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn rule_from_row(row: sqlx::any::AnyRow) -> EngineResult<SlaRule> {
    Ok(SlaRule {
        id: row.try_get("id")?,
        policy_id: row.try_get("policy_id")?,
        priority: row.try_get("priority")?,
        response_time_minutes: row.try_get("response_time_minutes")?,
        resolution_time_hours: row.try_get("resolution_time_hours")?,
        escalate_at_percent: row.try_get("escalate_at_percent")?,
        enabled: row.try_get::<i64, _>("enabled")? != 0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn tracking_from_row(row: sqlx::any::AnyRow) -> EngineResult<TicketSlaTracking> {
    let status_str: String = row.try_get("current_status")?;

    Ok(TicketSlaTracking {
        id: row.try_get("id")?,
        ticket_id: row.try_get("ticket_id")?,
        policy_id: row.try_get("policy_id")?,
        rule_id: row.try_get("rule_id")?,
        response_due: row.try_get("response_due")?,
        // Nullable columns can fail under the Any driver; treat as NULL
        response_completed_at: row
            .try_get::<Option<String>, _>("response_completed_at")
            .ok()
            .flatten(),
        response_breached: row.try_get::<i64, _>("response_breached")? != 0,
        resolution_due: row.try_get("resolution_due")?,
        resolution_completed_at: row
            .try_get::<Option<String>, _>("resolution_completed_at")
            .ok()
            .flatten(),
        resolution_breached: row.try_get::<i64, _>("resolution_breached")? != 0,
        current_status: status_str.parse::<SlaStatus>().map_err(decode_err)?,
        percent_consumed: row.try_get("percent_consumed")?,
        started_at: row.try_get("started_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn escalation_rule_from_row(row: sqlx::any::AnyRow) -> EngineResult<SlaEscalationRule> {
    Ok(SlaEscalationRule {
        id: row.try_get("id")?,
        policy_id: row.try_get("policy_id")?,
        level: row.try_get("level")?,
        trigger_percent: row.try_get("trigger_percent")?,
        notify_assignee: row.try_get::<i64, _>("notify_assignee")? != 0,
        notify_managers: row.try_get::<i64, _>("notify_managers")? != 0,
        auto_reassign_role: row
            .try_get::<Option<String>, _>("auto_reassign_role")
            .ok()
            .flatten(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn escalation_from_row(row: sqlx::any::AnyRow) -> EngineResult<SlaEscalation> {
    let notified_str: String = row.try_get("notified_user_ids")?;
    let notified_user_ids: Vec<String> = serde_json::from_str(&notified_str).unwrap_or_default();

    Ok(SlaEscalation {
        id: row.try_get("id")?,
        tracking_id: row.try_get("tracking_id")?,
        ticket_id: row.try_get("ticket_id")?,
        level: row.try_get("level")?,
        trigger_percent: row.try_get("trigger_percent")?,
        percent_at_fire: row.try_get("percent_at_fire")?,
        reassigned_to: row
            .try_get::<Option<String>, _>("reassigned_to")
            .ok()
            .flatten(),
        notified_user_ids,
        fired_at: row.try_get("fired_at")?,
    })
}

// Implement SlaRepository trait for Database
#[async_trait::async_trait]
impl crate::domain::ports::SlaRepository for Database {
    async fn create_sla_policy(&self, policy: &SlaPolicy) -> EngineResult<()> {
        self.create_sla_policy(policy).await
    }

    async fn get_sla_policy(&self, policy_id: &str) -> EngineResult<Option<SlaPolicy>> {
        self.get_sla_policy(policy_id).await
    }

    async fn get_active_sla_policy(&self) -> EngineResult<Option<SlaPolicy>> {
        self.get_active_sla_policy().await
    }

    async fn set_sla_policy_active(&self, policy_id: &str, active: bool) -> EngineResult<()> {
        self.set_sla_policy_active(policy_id, active).await
    }

    async fn create_sla_rule(&self, rule: &SlaRule) -> EngineResult<()> {
        self.create_sla_rule(rule).await
    }

    async fn get_enabled_rule(
        &self,
        policy_id: &str,
        priority: &str,
    ) -> EngineResult<Option<SlaRule>> {
        self.get_enabled_rule(policy_id, priority).await
    }

    async fn get_sla_rule(&self, rule_id: &str) -> EngineResult<Option<SlaRule>> {
        self.get_sla_rule(rule_id).await
    }

    async fn create_holiday(&self, holiday: &crate::models::Holiday) -> EngineResult<()> {
        self.create_holiday(holiday).await
    }

    async fn list_holidays(&self) -> EngineResult<Vec<crate::models::Holiday>> {
        self.list_holidays().await
    }

    async fn upsert_tracking(&self, tracking: &TicketSlaTracking) -> EngineResult<()> {
        self.upsert_tracking(tracking).await
    }

    async fn get_tracking_by_ticket(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Option<TicketSlaTracking>> {
        self.get_tracking_by_ticket(ticket_id).await
    }

    async fn list_open_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>> {
        self.list_open_trackings().await
    }

    async fn list_breached_trackings(&self) -> EngineResult<Vec<TicketSlaTracking>> {
        self.list_breached_trackings().await
    }

    async fn update_tracking_evaluation(
        &self,
        tracking_id: &str,
        status: SlaStatus,
        percent_consumed: f64,
        response_breached: bool,
        resolution_breached: bool,
    ) -> EngineResult<()> {
        self.update_tracking_evaluation(
            tracking_id,
            status,
            percent_consumed,
            response_breached,
            resolution_breached,
        )
        .await
    }

    async fn set_tracking_response_completed(
        &self,
        tracking_id: &str,
        completed_at: &str,
        breached: bool,
    ) -> EngineResult<()> {
        self.set_tracking_response_completed(tracking_id, completed_at, breached)
            .await
    }

    async fn set_tracking_resolution_completed(
        &self,
        tracking_id: &str,
        completed_at: &str,
        breached: bool,
    ) -> EngineResult<()> {
        self.set_tracking_resolution_completed(tracking_id, completed_at, breached)
            .await
    }

    async fn create_escalation_rule(&self, rule: &SlaEscalationRule) -> EngineResult<()> {
        self.create_escalation_rule(rule).await
    }

    async fn list_escalation_rules(
        &self,
        policy_id: &str,
    ) -> EngineResult<Vec<SlaEscalationRule>> {
        self.list_escalation_rules(policy_id).await
    }

    async fn escalation_exists(&self, tracking_id: &str, level: i64) -> EngineResult<bool> {
        self.escalation_exists(tracking_id, level).await
    }

    async fn insert_escalation(&self, escalation: &SlaEscalation) -> EngineResult<()> {
        self.insert_escalation(escalation).await
    }

    async fn update_escalation_outcome(
        &self,
        escalation_id: &str,
        reassigned_to: Option<&str>,
        notified_user_ids: &[String],
    ) -> EngineResult<()> {
        self.update_escalation_outcome(escalation_id, reassigned_to, notified_user_ids)
            .await
    }

    async fn list_escalations_by_ticket(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Vec<SlaEscalation>> {
        self.list_escalations_by_ticket(ticket_id).await
    }

    async fn append_ticket_event(&self, event: &crate::models::TicketEvent) -> EngineResult<()> {
        self.append_ticket_event(event).await
    }

    async fn list_ticket_events(
        &self,
        ticket_id: &str,
    ) -> EngineResult<Vec<crate::models::TicketEvent>> {
        self.list_ticket_events(ticket_id).await
    }
}
