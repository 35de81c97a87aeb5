pub mod alarm;
pub mod scheduler;
pub mod tasks;
pub mod types;

pub use alarm::AlarmReporter;
pub use scheduler::JobScheduler;
pub use tasks::SmsDrainTask;
pub use types::JobTask;
