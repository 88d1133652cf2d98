use crate::errors::EngineResult;
use crate::models::Job;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, job_type: &str, payload: Value, max_retries: i32)
        -> EngineResult<String>;
    async fn enqueue_at(
        &self,
        job_type: &str,
        payload: Value,
        run_at: chrono::DateTime<chrono::Utc>,
        max_retries: i32,
    ) -> EngineResult<String>;
    async fn fetch_next_job(&self) -> EngineResult<Option<Job>>;
    /// True when a pending or processing job of this type already exists.
    async fn has_live_job(&self, job_type: &str) -> EngineResult<bool>;
    async fn complete_job(&self, job_id: &str) -> EngineResult<()>;
    async fn fail_job(&self, job_id: &str, error: &str) -> EngineResult<()>;
}
