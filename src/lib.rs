pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod infrastructure;
pub mod models;
pub mod services;

pub use config::Config;
pub use errors::{EngineError, EngineResult};
pub use events::{EventBus, SystemEvent};
pub use infrastructure::persistence::Database;
pub use services::{
    EscalationEngine, NotificationService, PolicyResolver, TrackingService, WorkingCalendar,
};
