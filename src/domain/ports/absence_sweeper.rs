use crate::errors::EngineResult;
use chrono::NaiveDate;

/// Daily attendance anomaly sweep. Implemented by the attendance subsystem;
/// the scheduler only drives the cadence.
#[async_trait::async_trait]
pub trait AbsenceSweeper: Send + Sync {
    /// Returns the number of anomalies flagged for the date.
    async fn sweep(&self, date: NaiveDate) -> EngineResult<u64>;
}

/// Stand-in used when no attendance subsystem is wired.
pub struct NoopAbsenceSweeper;

#[async_trait::async_trait]
impl AbsenceSweeper for NoopAbsenceSweeper {
    async fn sweep(&self, date: NaiveDate) -> EngineResult<u64> {
        tracing::debug!("Absence sweep for {} skipped (no sweeper wired)", date);
        Ok(0)
    }
}
