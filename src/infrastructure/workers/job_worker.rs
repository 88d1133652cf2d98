use chrono::{Datelike, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::ports::{AbsenceSweeper, SlaRepository, TaskQueue, TicketStore};
use crate::models::{Job, TicketEvent, TicketEventType};
use crate::services::{EscalationEngine, TrackingService};

pub const JOB_EVALUATE_SLA: &str = "evaluate_sla";
pub const JOB_AUTO_CLOSE_RESOLVED: &str = "auto_close_resolved";
pub const JOB_ABSENCE_SWEEP: &str = "absence_sweep";

/// Drives the recurring cadences off the job queue. Each handler re-enqueues
/// its own next run after finishing, so two passes of the same cadence can
/// never overlap.
pub struct JobProcessor {
    queue: Arc<dyn TaskQueue>,
    sla_repo: Arc<dyn SlaRepository>,
    ticket_store: Arc<dyn TicketStore>,
    tracking_service: TrackingService,
    escalation_engine: EscalationEngine,
    absence_sweeper: Arc<dyn AbsenceSweeper>,
    config: Config,
}

impl JobProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        sla_repo: Arc<dyn SlaRepository>,
        ticket_store: Arc<dyn TicketStore>,
        tracking_service: TrackingService,
        escalation_engine: EscalationEngine,
        absence_sweeper: Arc<dyn AbsenceSweeper>,
        config: Config,
    ) -> Self {
        Self {
            queue,
            sla_repo,
            ticket_store,
            tracking_service,
            escalation_engine,
            absence_sweeper,
            config,
        }
    }

    /// Enqueue the recurring jobs unless a pending or running instance of
    /// each already exists. Safe to call on every boot.
    pub async fn seed_recurring_jobs(&self) -> Result<(), String> {
        let now = Utc::now();

        for (job_type, run_at) in [
            (JOB_EVALUATE_SLA, now),
            (JOB_AUTO_CLOSE_RESOLVED, now),
            (JOB_ABSENCE_SWEEP, next_sweep_instant(now, self.config.sweep_hour_utc)),
        ] {
            let live = self
                .queue
                .has_live_job(job_type)
                .await
                .map_err(|e| e.to_string())?;
            if live {
                continue;
            }
            self.queue
                .enqueue_at(job_type, Value::Null, run_at, 3)
                .await
                .map_err(|e| e.to_string())?;
            info!("Scheduled recurring job {} (first run {})", job_type, run_at);
        }

        Ok(())
    }

    pub async fn run(&self) {
        info!("Starting JobProcessor...");
        loop {
            match self.process_next().await {
                Ok(Some(_)) => {
                    // Job processed, check for next one immediately
                    continue;
                }
                Ok(None) => {
                    // No jobs, sleep briefly
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => {
                    error!("Error processing job: {}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    pub async fn process_next(&self) -> Result<Option<()>, String> {
        let job = self
            .queue
            .fetch_next_job()
            .await
            .map_err(|e| e.to_string())?;

        if let Some(job) = job {
            info!("Processing job {} (type: {})", job.id, job.job_type);

            let result = self.execute_job(&job).await;

            match result {
                Ok(_) => {
                    info!("Job {} completed successfully", job.id);
                    if let Err(e) = self.queue.complete_job(&job.id).await {
                        error!("Failed to mark job {} as completed: {}", job.id, e);
                    }
                }
                Err(e) => {
                    error!("Job {} failed: {}", job.id, e);
                    if let Err(retry_err) = self.queue.fail_job(&job.id, &e).await {
                        error!("Failed to mark job {} as failed: {}", job.id, retry_err);
                    }
                }
            }

            Ok(Some(()))
        } else {
            Ok(None)
        }
    }

    async fn execute_job(&self, job: &Job) -> Result<(), String> {
        match job.job_type.as_str() {
            JOB_EVALUATE_SLA => self.handle_evaluate_sla().await,
            JOB_AUTO_CLOSE_RESOLVED => self.handle_auto_close_resolved().await,
            JOB_ABSENCE_SWEEP => self.handle_absence_sweep().await,
            _ => Err(format!("Unknown job type: {}", job.job_type)),
        }
    }

    // --- Job Handlers ---

    /// One evaluation pass over every open tracking. A failure on one ticket
    /// is logged and the pass moves on; it never aborts the loop.
    async fn handle_evaluate_sla(&self) -> Result<(), String> {
        if let Err(e) = self.run_evaluation_pass().await {
            error!("SLA evaluation pass failed: {}", e);
        }

        let next_run =
            Utc::now() + chrono::Duration::seconds(self.config.evaluation_interval_secs);
        self.queue
            .enqueue_at(JOB_EVALUATE_SLA, Value::Null, next_run, 3)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub async fn run_evaluation_pass(&self) -> Result<(), String> {
        let trackings = self
            .sla_repo
            .list_open_trackings()
            .await
            .map_err(|e| e.to_string())?;

        if trackings.is_empty() {
            return Ok(());
        }

        // One calendar snapshot per pass; holiday edits apply next pass.
        let calendar = self
            .tracking_service
            .load_calendar()
            .await
            .map_err(|e| e.to_string())?;

        let now = Utc::now();
        let mut evaluated = 0u32;

        for tracking in &trackings {
            let evaluation = match self
                .tracking_service
                .evaluate(tracking, &calendar, now)
                .await
            {
                Ok(Some(evaluation)) => evaluation,
                Ok(None) => continue,
                Err(e) => {
                    error!("Evaluation failed for tracking {}: {}", tracking.id, e);
                    continue;
                }
            };
            evaluated += 1;

            if let Err(e) = self
                .escalation_engine
                .run(tracking, evaluation.percent_consumed)
                .await
            {
                error!("Escalation failed for tracking {}: {}", tracking.id, e);
            }
        }

        info!("SLA evaluation pass finished ({} trackings)", evaluated);
        Ok(())
    }

    /// Close tickets that have sat in resolved past the configured window.
    async fn handle_auto_close_resolved(&self) -> Result<(), String> {
        if let Err(e) = self.run_auto_close_pass().await {
            error!("Auto-close pass failed: {}", e);
        }

        let next_run =
            Utc::now() + chrono::Duration::seconds(self.config.automation_interval_secs);
        self.queue
            .enqueue_at(JOB_AUTO_CLOSE_RESOLVED, Value::Null, next_run, 3)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub async fn run_auto_close_pass(&self) -> Result<u32, String> {
        let cutoff =
            (Utc::now() - chrono::Duration::seconds(self.config.auto_close_after_secs))
                .to_rfc3339();

        let ticket_ids = self
            .ticket_store
            .resolved_before(&cutoff)
            .await
            .map_err(|e| e.to_string())?;

        let mut closed = 0u32;
        for ticket_id in ticket_ids {
            if let Err(e) = self.ticket_store.close_ticket(&ticket_id).await {
                error!("Auto-close failed for ticket {}: {}", ticket_id, e);
                continue;
            }
            if let Err(e) = self
                .sla_repo
                .append_ticket_event(&TicketEvent::new(
                    ticket_id.clone(),
                    TicketEventType::TicketAutoClosed,
                    serde_json::json!({ "cutoff": cutoff }),
                ))
                .await
            {
                warn!("Auto-close event append failed for ticket {}: {}", ticket_id, e);
            }
            closed += 1;
        }

        if closed > 0 {
            info!("Auto-closed {} tickets resolved before {}", closed, cutoff);
        }
        Ok(closed)
    }

    /// Daily attendance anomaly sweep at the configured UTC hour.
    async fn handle_absence_sweep(&self) -> Result<(), String> {
        let today = Utc::now().date_naive();
        match self.absence_sweeper.sweep(today).await {
            Ok(count) => {
                if count > 0 {
                    info!("Absence sweep flagged {} anomalies for {}", count, today);
                }
            }
            Err(e) => error!("Absence sweep failed for {}: {}", today, e),
        }

        let next_run = next_sweep_instant(Utc::now(), self.config.sweep_hour_utc);
        self.queue
            .enqueue_at(JOB_ABSENCE_SWEEP, Value::Null, next_run, 3)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Next occurrence of `hour:00:00Z` strictly after `now`.
fn next_sweep_instant(
    now: chrono::DateTime<Utc>,
    hour: u32,
) -> chrono::DateTime<Utc> {
    let today_at = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, 0, 0)
        .single()
        .unwrap_or(now);
    if today_at > now {
        today_at
    } else {
        today_at + chrono::Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_later_today_when_hour_not_passed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
        let next = next_sweep_instant(now, 2);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap());
    }

    #[test]
    fn sweep_rolls_to_tomorrow_after_hour() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
        let next = next_sweep_instant(now, 2);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 11, 2, 0, 0).unwrap());
    }
}
