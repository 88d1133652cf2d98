use crate::errors::EngineResult;
use crate::models::UserRef;

/// Assignment ownership and workload accounting live elsewhere.
#[async_trait::async_trait]
pub trait AssignmentWorkload: Send + Sync {
    async fn get_user(&self, user_id: &str) -> EngineResult<Option<UserRef>>;
    async fn adjust_workload(&self, user_id: &str, delta: i64) -> EngineResult<()>;
    /// Least-loaded active user holding the role, if any.
    async fn find_active_user_by_role(&self, role: &str) -> EngineResult<Option<UserRef>>;
    async fn list_active_users_by_role(&self, role: &str) -> EngineResult<Vec<UserRef>>;
    async fn user_has_role(&self, user_id: &str, role: &str) -> EngineResult<bool>;
}
