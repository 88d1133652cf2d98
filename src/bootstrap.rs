use crate::config::Config;
use crate::domain::ports::{
    AbsenceSweeper, AssignmentWorkload, NotificationDispatcher, NotificationRepository,
    SlaRepository, TaskQueue, TicketStore,
};
use crate::events::EventBus;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::workers::{DbTaskQueue, JobProcessor};
use crate::services::{EscalationEngine, NotificationService, TrackingService};
use std::sync::Arc;

/// Everything a running engine needs, wired once at startup.
pub struct Engine {
    pub tracking_service: TrackingService,
    pub escalation_engine: EscalationEngine,
    pub processor: Arc<JobProcessor>,
    pub event_bus: Arc<EventBus>,
}

/// Wire the services against one database and seed the recurring jobs.
pub async fn build_engine(
    db: Database,
    config: &Config,
) -> Result<Engine, Box<dyn std::error::Error>> {
    let event_bus = Arc::new(EventBus::new(1000));
    tracing::info!("Event bus initialized with capacity 1000");

    let sla_repo: Arc<dyn SlaRepository> = Arc::new(db.clone());
    let ticket_store: Arc<dyn TicketStore> = Arc::new(db.clone());
    let workload: Arc<dyn AssignmentWorkload> = Arc::new(db.clone());
    let notification_repo: Arc<dyn NotificationRepository> = Arc::new(db.clone());

    let notifier: Arc<dyn NotificationDispatcher> =
        Arc::new(NotificationService::new(notification_repo));
    tracing::info!("Notification service initialized");

    let tracking_service =
        TrackingService::new(sla_repo.clone(), ticket_store.clone(), event_bus.clone());
    tracing::info!("Tracking service initialized");

    let escalation_engine = EscalationEngine::new(
        sla_repo.clone(),
        ticket_store.clone(),
        workload,
        notifier,
        event_bus.clone(),
        event_bus.clone(),
    );
    tracing::info!("Escalation engine initialized");

    let queue: Arc<dyn TaskQueue> = Arc::new(DbTaskQueue::new(db));
    let sweeper: Arc<dyn AbsenceSweeper> =
        Arc::new(crate::domain::ports::NoopAbsenceSweeper);

    let processor = Arc::new(JobProcessor::new(
        queue,
        sla_repo,
        ticket_store,
        tracking_service.clone(),
        escalation_engine.clone(),
        sweeper,
        config.clone(),
    ));

    processor.seed_recurring_jobs().await?;
    tracing::info!("Recurring jobs seeded");

    Ok(Engine {
        tracking_service,
        escalation_engine,
        processor,
        event_bus,
    })
}
