use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

/// Trait that all periodic tasks must implement.
///
/// Tasks are explicit objects composed with the [`crate::jobs::JobScheduler`];
/// a task only describes its unit of work and cadence, supervision and alarm
/// reporting live in the scheduler.
#[async_trait]
pub trait JobTask: Send + Sync {
    /// Task name used in logs and alarm cards.
    fn name(&self) -> &'static str;

    /// Tick cadence.
    fn interval(&self) -> Duration;

    /// Execute one tick of work.
    async fn run(&self) -> AppResult<()>;
}
