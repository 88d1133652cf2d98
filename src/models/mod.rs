pub mod duration;
pub mod escalation;
pub mod holiday;
pub mod job;
pub mod notification;
pub mod policy;
pub mod ticket;
pub mod ticket_event;
pub mod tracking;

pub use escalation::*;
pub use holiday::*;
pub use job::*;
pub use notification::*;
pub use policy::*;
pub use ticket::*;
pub use ticket_event::*;
pub use tracking::*;
