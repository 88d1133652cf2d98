pub mod calendar;
pub mod due_time;
pub mod escalation_engine;
pub mod notification_service;
pub mod policy_resolver;
pub mod tracking_service;

pub use calendar::WorkingCalendar;
pub use due_time::DueTimeCalculator;
pub use escalation_engine::EscalationEngine;
pub use notification_service::NotificationService;
pub use policy_resolver::PolicyResolver;
pub use tracking_service::{Evaluation, InitializeOutcome, TrackingService};
