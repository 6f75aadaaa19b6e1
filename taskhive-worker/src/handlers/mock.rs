/// Mock handler for testing the runner
///
/// Records every job it is handed and succeeds or fails on command, so
/// runner tests can observe dispatch and terminal-state marking without a
/// real delivery channel.
///
/// # Example
///
/// ```no_run
/// use taskhive_worker::handlers::mock::MockHandler;
/// use taskhive_worker::handlers::JobHandler;
///
/// let handler = MockHandler::new();
/// assert_eq!(handler.name(), "mock");
/// assert_eq!(handler.handled(), 0);
/// ```
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use taskhive_shared::models::scheduled_job::ScheduledJob;
use taskhive_shared::push::PushError;

use super::{HandlerError, JobHandler};

/// Mock handler implementation
pub struct MockHandler {
    handled: AtomicUsize,
    seen: Mutex<Vec<Uuid>>,
    fail_with: Option<String>,
}

impl MockHandler {
    /// A handler that accepts every job.
    pub fn new() -> Self {
        MockHandler {
            handled: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// A handler that fails every job with the given message.
    pub fn failing(message: &str) -> Self {
        MockHandler {
            handled: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    /// How many jobs this handler has been handed.
    pub fn handled(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }

    /// IDs of the jobs handled, in order.
    pub fn seen(&self) -> Vec<Uuid> {
        self.seen.lock().expect("mock handler lock poisoned").clone()
    }
}

impl Default for MockHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobHandler for MockHandler {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn handle(&self, _db: &PgPool, job: &ScheduledJob) -> Result<(), HandlerError> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("mock handler lock poisoned")
            .push(job.id);

        match &self.fail_with {
            Some(message) => Err(HandlerError::Push(PushError::Provider(message.clone()))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use taskhive_shared::models::scheduled_job::JobState;

    fn sample_job() -> ScheduledJob {
        ScheduledJob {
            id: Uuid::new_v4(),
            name: "mock".to_string(),
            payload: json!({}),
            run_at: Utc::now(),
            state: JobState::Running,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_counts_handled_jobs() {
        let pool = PgPool::connect_lazy("postgresql://localhost/taskhive_test").unwrap();
        let handler = MockHandler::new();

        let first = sample_job();
        let second = sample_job();
        handler.handle(&pool, &first).await.unwrap();
        handler.handle(&pool, &second).await.unwrap();

        assert_eq!(handler.handled(), 2);
        assert_eq!(handler.seen(), vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_failing_handler_errors() {
        let pool = PgPool::connect_lazy("postgresql://localhost/taskhive_test").unwrap();
        let handler = MockHandler::failing("simulated provider outage");

        let result = handler.handle(&pool, &sample_job()).await;
        assert!(result.is_err());
        assert_eq!(handler.handled(), 1);
    }
}
