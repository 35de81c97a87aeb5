use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::jobs::types::JobTask;
use crate::services::SmsService;

/// Periodic consumer of the SMS queue.
///
/// One instance, one timer; overlap protection comes from the scheduler's
/// supervision, so each tick is the queue's single consumer.
pub struct SmsDrainTask {
    sms: SmsService,
    interval: Duration,
}

impl SmsDrainTask {
    pub fn new(sms: SmsService, interval_seconds: u64) -> Self {
        Self {
            sms,
            interval: Duration::from_secs(interval_seconds),
        }
    }
}

#[async_trait]
impl JobTask for SmsDrainTask {
    fn name(&self) -> &'static str {
        "sms_drain"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> AppResult<()> {
        let drained = self.sms.drain_once().await?;
        if drained > 0 {
            tracing::info!(drained, "SMS drain tick completed");
        }
        Ok(())
    }
}
