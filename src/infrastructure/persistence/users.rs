use crate::errors::EngineResult;
use crate::infrastructure::persistence::Database;
use crate::models::UserRef;
use sqlx::Row;

impl Database {
    pub async fn get_user(&self, id: &str) -> EngineResult<Option<UserRef>> {
        let row = sqlx::query("SELECT id, name, email, role, is_active FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        row.map(user_from_row).transpose()
    }

    pub async fn adjust_workload(&self, user_id: &str, delta: i64) -> EngineResult<()> {
        // Workload never drops below zero even if counters drift
        sqlx::query("UPDATE users SET workload = MAX(0, workload + ?) WHERE id = ?")
            .bind(delta)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Least-loaded active user holding the role; ties break on id for
    /// deterministic assignment.
    pub async fn find_active_user_by_role(&self, role: &str) -> EngineResult<Option<UserRef>> {
        let row = sqlx::query(
            "SELECT id, name, email, role, is_active FROM users
             WHERE role = ? AND is_active = ?
             ORDER BY workload ASC, id ASC LIMIT 1",
        )
        .bind(role)
        .bind(true)
        .fetch_optional(self.pool())
        .await?;

        row.map(user_from_row).transpose()
    }

    pub async fn list_active_users_by_role(&self, role: &str) -> EngineResult<Vec<UserRef>> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, is_active FROM users
             WHERE role = ? AND is_active = ? ORDER BY id ASC",
        )
        .bind(role)
        .bind(true)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(user_from_row).collect()
    }

    pub async fn user_has_role(&self, user_id: &str, role: &str) -> EngineResult<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ? AND role = ?")
                .bind(user_id)
                .bind(role)
                .fetch_one(self.pool())
                .await?;

        Ok(count > 0)
    }
}

fn user_from_row(row: sqlx::any::AnyRow) -> EngineResult<UserRef> {
    Ok(UserRef {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
    })
}

// Implement AssignmentWorkload trait for Database
#[async_trait::async_trait]
impl crate::domain::ports::AssignmentWorkload for Database {
    async fn get_user(&self, user_id: &str) -> EngineResult<Option<UserRef>> {
        self.get_user(user_id).await
    }

    async fn adjust_workload(&self, user_id: &str, delta: i64) -> EngineResult<()> {
        self.adjust_workload(user_id, delta).await
    }

    async fn find_active_user_by_role(&self, role: &str) -> EngineResult<Option<UserRef>> {
        self.find_active_user_by_role(role).await
    }

    async fn list_active_users_by_role(&self, role: &str) -> EngineResult<Vec<UserRef>> {
        self.list_active_users_by_role(role).await
    }

    async fn user_has_role(&self, user_id: &str, role: &str) -> EngineResult<bool> {
        self.user_has_role(user_id, role).await
    }
}
