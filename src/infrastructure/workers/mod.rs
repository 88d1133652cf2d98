pub mod job_queue;
pub mod job_worker;

pub use job_queue::DbTaskQueue;
pub use job_worker::JobProcessor;
