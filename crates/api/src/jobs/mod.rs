//! Background job scheduler and job implementations.

mod pending_reminder;
mod pool_metrics;
mod scheduler;
mod weekly_summary;

pub use pending_reminder::PendingReminderJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::JobScheduler;
pub use weekly_summary::WeeklySummaryJob;
