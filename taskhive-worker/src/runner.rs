/// Delayed-job runner
///
/// This module implements the main worker loop. It polls `scheduled_jobs`
/// for due rows, dispatches each to the handler registered under its job
/// name, and records the terminal state on the row.
///
/// # Architecture
///
/// ```text
/// Runner
///   ├─> ScheduledJob::release_stuck  (startup: reclaim orphaned rows)
///   ├─> ScheduledJob::claim_due      (FOR UPDATE SKIP LOCKED)
///   ├─> JobHandler::handle           (spawned, bounded concurrency)
///   └─> ScheduledJob::mark_succeeded / mark_failed
/// ```
///
/// # Concurrency
///
/// Claimed jobs run on spawned Tokio tasks tracked in a `JoinSet`; the loop
/// never holds more than `max_concurrent` in flight and claims in batches
/// sized to the free slots. Shutdown is cooperative: on cancellation the
/// loop stops claiming and drains the in-flight set.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhive_worker::runner::{Runner, RunnerConfig};
/// use taskhive_worker::handlers::mock::MockHandler;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let mut runner = Runner::new(pool, RunnerConfig::default());
/// runner.register(Arc::new(MockHandler::new()));
///
/// let shutdown = runner.shutdown_token();
/// runner.run().await?;
/// # Ok(())
/// # }
/// ```
use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::task::JoinSet;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use taskhive_shared::models::scheduled_job::ScheduledJob;

use crate::handlers::JobHandler;

/// Runner loop configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Seconds between polls when the queue is empty
    pub poll_interval_secs: u64,

    /// Maximum jobs claimed per poll
    pub batch_size: i64,

    /// Maximum jobs executing at once
    pub max_concurrent: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            poll_interval_secs: 5,
            batch_size: 10,
            max_concurrent: 10,
        }
    }
}

/// The delayed-job runner
///
/// Owns the handler registry and the claim/dispatch/mark loop.
pub struct Runner {
    db: PgPool,
    config: RunnerConfig,
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
    shutdown_token: CancellationToken,
}

impl Runner {
    pub fn new(db: PgPool, config: RunnerConfig) -> Self {
        Runner {
            db,
            config,
            handlers: HashMap::new(),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Registers a handler under the job name it owns.
    ///
    /// A second registration for the same name replaces the first.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let name = handler.name();
        tracing::info!(job = %name, "Registering job handler");
        self.handlers.insert(name, handler);
    }

    /// Token external handlers cancel to request graceful shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the worker loop until shutdown.
    ///
    /// Rows left in the running state by a previous process are released
    /// back to pending before the first poll.
    ///
    /// # Errors
    ///
    /// Claim and mark errors are logged and retried on the next poll; only
    /// the startup release can fail the call.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval_secs,
            batch_size = self.config.batch_size,
            max_concurrent = self.config.max_concurrent,
            "Job runner starting"
        );

        let released = ScheduledJob::release_stuck(&self.db).await?;
        if released > 0 {
            tracing::warn!(count = released, "Released jobs stuck in running state");
        }

        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            if self.shutdown_token.is_cancelled() {
                break;
            }

            // Reap finished executions without blocking
            while in_flight.try_join_next().is_some() {}

            let free_slots = self.config.max_concurrent.saturating_sub(in_flight.len());
            if free_slots == 0 {
                tokio::select! {
                    _ = in_flight.join_next() => {}
                    _ = self.shutdown_token.cancelled() => break,
                }
                continue;
            }

            let limit = self.config.batch_size.min(free_slots as i64);
            let jobs = match ScheduledJob::claim_due(&self.db, limit).await {
                Ok(jobs) => jobs,
                Err(err) => {
                    tracing::error!(error = %err, "Failed to claim jobs");
                    self.idle().await;
                    continue;
                }
            };

            if jobs.is_empty() {
                self.idle().await;
                continue;
            }

            for job in jobs {
                self.dispatch(&mut in_flight, job);
            }
        }

        tracing::info!(
            in_flight = in_flight.len(),
            "Shutdown requested, draining in-flight jobs"
        );
        while in_flight.join_next().await.is_some() {}
        tracing::info!("Job runner shut down");

        Ok(())
    }

    /// Sleeps one poll interval, waking early on shutdown.
    async fn idle(&self) {
        tokio::select! {
            _ = sleep(Duration::from_secs(self.config.poll_interval_secs)) => {}
            _ = self.shutdown_token.cancelled() => {}
        }
    }

    /// Spawns one claimed job onto the in-flight set.
    fn dispatch(&self, in_flight: &mut JoinSet<()>, job: ScheduledJob) {
        let Some(handler) = self.handlers.get(job.name.as_str()).cloned() else {
            tracing::error!(job_id = %job.id, job = %job.name, "No handler registered");
            let db = self.db.clone();
            in_flight.spawn(async move {
                mark_failed(&db, &job, "No handler registered for job name").await;
            });
            return;
        };

        let db = self.db.clone();
        in_flight.spawn(async move {
            execute_job(db, handler, job).await;
        });
    }
}

/// Runs one claimed job to its terminal state.
async fn execute_job(db: PgPool, handler: Arc<dyn JobHandler>, job: ScheduledJob) {
    tracing::info!(job_id = %job.id, job = %job.name, run_at = %job.run_at, "Executing job");

    match handler.handle(&db, &job).await {
        Ok(()) => {
            match ScheduledJob::mark_succeeded(&db, job.id).await {
                Ok(true) => {
                    tracing::info!(job_id = %job.id, "Job succeeded");
                }
                Ok(false) => {
                    // Row is gone or not running; nothing to record
                    tracing::warn!(job_id = %job.id, "Job finished but was not in running state");
                }
                Err(err) => {
                    tracing::error!(job_id = %job.id, error = %err, "Failed to mark job succeeded");
                }
            }
        }
        Err(err) => {
            tracing::error!(job_id = %job.id, error = %err, "Job failed");
            mark_failed(&db, &job, &err.to_string()).await;
        }
    }
}

async fn mark_failed(db: &PgPool, job: &ScheduledJob, error: &str) {
    if let Err(err) = ScheduledJob::mark_failed(db, job.id, error).await {
        tracing::error!(job_id = %job.id, error = %err, "Failed to mark job failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::mock::MockHandler;

    #[test]
    fn test_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrent, 10);
    }

    #[tokio::test]
    async fn test_register_replaces_by_name() {
        let pool = PgPool::connect_lazy("postgresql://localhost/taskhive_test").unwrap();
        let mut runner = Runner::new(pool, RunnerConfig::default());

        runner.register(Arc::new(MockHandler::new()));
        runner.register(Arc::new(MockHandler::failing("boom")));

        assert_eq!(runner.handlers.len(), 1);
    }

    // Claim/execute/mark semantics against real rows are covered by the
    // ignored database tests in taskhive-api/tests
}
