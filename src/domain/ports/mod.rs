pub mod absence_sweeper;
pub mod assignment_workload;
pub mod live_update;
pub mod notification_dispatcher;
pub mod notification_repository;
pub mod sla_repository;
pub mod task_queue;
pub mod ticket_store;

pub use absence_sweeper::{AbsenceSweeper, NoopAbsenceSweeper};
pub use assignment_workload::AssignmentWorkload;
pub use live_update::LiveUpdateBroadcaster;
pub use notification_dispatcher::NotificationDispatcher;
pub use notification_repository::NotificationRepository;
pub use sla_repository::SlaRepository;
pub use task_queue::TaskQueue;
pub use ticket_store::TicketStore;
