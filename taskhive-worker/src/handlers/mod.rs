/// Job handler contract
///
/// This module defines the contract that all job handlers must implement.
/// A handler owns one job name: the runner looks handlers up by name and
/// hands each claimed row to the matching one.
///
/// # Handler Contract
///
/// All handlers must:
/// 1. Implement the `JobHandler` trait (async)
/// 2. Treat the payload as untrusted and re-resolve referenced rows
/// 3. Return `Ok(())` for jobs that are no longer relevant (skips are
///    successes, not failures)
/// 4. Return `Err` only for genuine delivery or persistence failures
///
/// # Example
///
/// ```no_run
/// use taskhive_worker::handlers::{HandlerError, JobHandler};
/// use async_trait::async_trait;
/// use sqlx::PgPool;
/// use taskhive_shared::models::scheduled_job::ScheduledJob;
///
/// struct LogHandler;
///
/// #[async_trait]
/// impl JobHandler for LogHandler {
///     fn name(&self) -> &'static str {
///         "log"
///     }
///
///     async fn handle(&self, _db: &PgPool, job: &ScheduledJob) -> Result<(), HandlerError> {
///         tracing::info!(payload = %job.payload, "Handling job");
///         Ok(())
///     }
/// }
/// ```
pub mod mock;
pub mod task_notify;

use async_trait::async_trait;
use sqlx::PgPool;

use taskhive_shared::models::scheduled_job::ScheduledJob;
use taskhive_shared::push::PushError;

/// Error type for job handlers
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Payload did not match the handler's schema
    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Database error while resolving or recording
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Push delivery failed
    #[error(transparent)]
    Push(#[from] PushError),
}

/// Core job handler trait
///
/// One implementation per job name.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Returns the job name this handler owns
    ///
    /// Used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Handles one claimed job
    ///
    /// # Returns
    ///
    /// `Ok(())` when the job is done or no longer relevant; `Err` marks
    /// the job failed with the error text stored on the row.
    async fn handle(&self, db: &PgPool, job: &ScheduledJob) -> Result<(), HandlerError>;
}
