//! Periodic job scheduler with supervised, non-overlapping task runs.
//!
//! Wraps tokio-cron-scheduler: every registered task runs once immediately on
//! start, then on its own cadence. A failing run never reaches the scheduler
//! loop; it is caught by the supervisor and funneled to the alarm reporter.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::error::{AppError, AppResult};
use crate::jobs::alarm::AlarmReporter;
use crate::jobs::types::JobTask;

/// A task plus its overlap guard.
///
/// The guard enforces single-consumer semantics: when a tick fires while the
/// previous run still holds the lock, the tick is skipped instead of running
/// concurrently.
pub(crate) struct SupervisedTask {
    task: Box<dyn JobTask>,
    guard: Mutex<()>,
}

impl SupervisedTask {
    pub(crate) fn new(task: Box<dyn JobTask>) -> Self {
        Self {
            task,
            guard: Mutex::new(()),
        }
    }

    /// Run one supervised tick: skip if still running, catch and report any
    /// failure.
    pub(crate) async fn tick(&self, alarm: &AlarmReporter) {
        let Ok(_lock) = self.guard.try_lock() else {
            tracing::warn!(task = self.task.name(), "Previous run still active, skipping tick");
            return;
        };

        if let Err(e) = self.task.run().await {
            tracing::error!(task = self.task.name(), error = %e, "Task run failed");
            alarm.report(self.task.name(), &e).await;
        }
    }
}

/// Wrapper around tokio-cron-scheduler holding the task table.
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    alarm: Arc<AlarmReporter>,
    tasks: Vec<Arc<SupervisedTask>>,
}

impl JobScheduler {
    pub async fn new(alarm: AlarmReporter) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            alarm: Arc::new(alarm),
            tasks: Vec::new(),
        })
    }

    /// Register a task to run on its interval.
    pub async fn register(&mut self, task: Box<dyn JobTask>) -> AppResult<()> {
        let interval = task.interval();
        let name = task.name();
        let supervised = Arc::new(SupervisedTask::new(task));
        self.tasks.push(Arc::clone(&supervised));

        let alarm = Arc::clone(&self.alarm);
        let cron_job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let supervised = Arc::clone(&supervised);
            let alarm = Arc::clone(&alarm);
            Box::pin(async move {
                supervised.tick(&alarm).await;
            })
        })
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        tracing::info!(task = name, interval_secs = interval.as_secs(), "Task registered");
        Ok(())
    }

    /// Run every task once, then start the periodic loop.
    pub async fn start(&self) -> AppResult<()> {
        for supervised in &self.tasks {
            supervised.tick(&self.alarm).await;
        }

        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        tracing::info!(tasks = self.tasks.len(), "Job scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully.
    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeishuConfig;
    use crate::external::FeishuClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingTask {
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl JobTask for CountingTask {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn interval(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn run(&self) -> AppResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::Gateway {
                    message: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn test_alarm() -> AlarmReporter {
        AlarmReporter::new(FeishuClient::new(FeishuConfig::default()))
    }

    #[tokio::test]
    async fn failing_task_is_caught_by_supervisor() {
        let runs = Arc::new(AtomicUsize::new(0));
        let supervised = SupervisedTask::new(Box::new(CountingTask {
            runs: Arc::clone(&runs),
            fail: true,
        }));

        // Must not panic or propagate despite the task error and the
        // unconfigured alarm channel.
        supervised.tick(&test_alarm()).await;
        supervised.tick(&test_alarm()).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped() {
        let runs = Arc::new(AtomicUsize::new(0));
        let supervised = SupervisedTask::new(Box::new(CountingTask {
            runs: Arc::clone(&runs),
            fail: false,
        }));

        // Hold the guard to simulate a still-running previous tick.
        let held = supervised.guard.lock().await;
        supervised.tick(&test_alarm()).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        drop(held);

        supervised.tick(&test_alarm()).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn start_runs_registered_tasks_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new(test_alarm()).await.unwrap();
        scheduler
            .register(Box::new(CountingTask {
                runs: Arc::clone(&runs),
                fail: false,
            }))
            .await
            .unwrap();

        scheduler.start().await.unwrap();
        assert!(runs.load(Ordering::SeqCst) >= 1);
        scheduler.stop().await.unwrap();
    }
}
