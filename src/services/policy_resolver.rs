use crate::domain::ports::SlaRepository;
use crate::errors::EngineResult;
use crate::models::{normalize_priority, SlaPolicy, SlaRule};
use std::sync::Arc;

/// Selects the active policy and the rule matching a ticket's priority.
/// A miss at every step means "SLA not applicable", never an error.
#[derive(Clone)]
pub struct PolicyResolver {
    sla_repo: Arc<dyn SlaRepository>,
}

impl PolicyResolver {
    pub fn new(sla_repo: Arc<dyn SlaRepository>) -> Self {
        Self { sla_repo }
    }

    /// The single policy consulted for all tickets. When several rows are
    /// active, the most recently activated one wins.
    pub async fn active_policy(&self) -> EngineResult<Option<SlaPolicy>> {
        self.sla_repo.get_active_sla_policy().await
    }

    /// Rule lookup with the priority fallback chain: normalized label,
    /// then lowercase, then the "Low" rule.
    pub async fn resolve_rule(
        &self,
        policy_id: &str,
        priority: &str,
    ) -> EngineResult<Option<SlaRule>> {
        let normalized = normalize_priority(priority);

        if let Some(rule) = self.sla_repo.get_enabled_rule(policy_id, &normalized).await? {
            return Ok(Some(rule));
        }

        let lowercase = normalized.to_lowercase();
        if let Some(rule) = self.sla_repo.get_enabled_rule(policy_id, &lowercase).await? {
            return Ok(Some(rule));
        }

        if let Some(rule) = self.sla_repo.get_enabled_rule(policy_id, "Low").await? {
            return Ok(Some(rule));
        }
        self.sla_repo.get_enabled_rule(policy_id, "low").await
    }
}
