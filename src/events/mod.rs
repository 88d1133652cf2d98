use crate::domain::ports::LiveUpdateBroadcaster;
use crate::models::SlaStatus;
use tokio::sync::broadcast;

/// Events emitted by the SLA engine for live-update subscribers
#[derive(Debug, Clone)]
pub enum SystemEvent {
    SlaStatusChanged {
        ticket_id: String,
        tracking_id: String,
        old_status: SlaStatus,
        new_status: SlaStatus,
        percent_consumed: f64,
        timestamp: String, // ISO 8601
    },
    EscalationFired {
        ticket_id: String,
        tracking_id: String,
        level: i64,
        trigger_percent: i64,
        reassigned_to: Option<String>,
        timestamp: String, // ISO 8601
    },
    DashboardChanged {
        source: String,
        timestamp: String, // ISO 8601
    },
}

/// Event bus for publishing and subscribing to engine events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SystemEvent>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all subscribers (non-blocking, fire-and-forget)
    pub fn publish(&self, event: SystemEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("Event not delivered (no subscribers): {}", e);
        }
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LiveUpdateBroadcaster for EventBus {
    fn broadcast_dashboard_changed(&self, source: &str) {
        self.publish(SystemEvent::DashboardChanged {
            source: source.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }
}
