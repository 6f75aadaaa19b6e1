/// Delayed job queue model
///
/// The queue is a plain Postgres table. The API schedules and cancels rows;
/// the worker claims due rows and records outcomes. Claiming uses
/// `FOR UPDATE SKIP LOCKED` so multiple workers never double-run a job, and
/// cancellation matches pending rows by name plus JSONB payload containment
/// so callers can target e.g. one task's reminder without knowing the job ID.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE job_state AS ENUM ('pending', 'running', 'succeeded', 'failed');
///
/// CREATE TABLE scheduled_jobs (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     payload JSONB NOT NULL DEFAULT '{}',
///     run_at TIMESTAMPTZ NOT NULL,
///     state job_state NOT NULL DEFAULT 'pending',
///     error TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::scheduled_job::ScheduledJob;
/// use chrono::{Duration, Utc};
/// use serde_json::json;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let run_at = Utc::now() + Duration::hours(1);
/// ScheduledJob::schedule(&pool, "task-notify", run_at, json!({"type": "eta_reminder"}))
///     .await?;
///
/// // Later: drop it before it fires
/// let cancelled =
///     ScheduledJob::cancel_matching(&pool, "task-notify", &json!({"type": "eta_reminder"}))
///         .await?;
/// assert_eq!(cancelled, 1);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting for its run time
    Pending,
    /// Claimed by a worker
    Running,
    /// Handler completed
    Succeeded,
    /// Handler errored; `error` carries the message
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }
}

/// A queued job row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledJob {
    /// Unique job ID (UUID v4)
    pub id: Uuid,

    /// Handler key the worker dispatches on
    pub name: String,

    /// Handler arguments; matched by `@>` on cancellation
    pub payload: JsonValue,

    /// Earliest time the job may run
    pub run_at: DateTime<Utc>,

    pub state: JobState,

    /// Failure detail once the job has failed
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const JOB_COLUMNS: &str = "id, name, payload, run_at, state, error, created_at, updated_at";

impl ScheduledJob {
    /// Enqueues a job to run at `run_at`.
    pub async fn schedule(
        pool: &PgPool,
        name: &str,
        run_at: DateTime<Utc>,
        payload: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let job = sqlx::query_as::<_, ScheduledJob>(&format!(
            r#"
            INSERT INTO scheduled_jobs (id, name, payload, run_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(payload)
        .bind(run_at)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    /// Finds a job by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let job = sqlx::query_as::<_, ScheduledJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(job)
    }

    /// Deletes pending jobs whose payload contains `filter`, returning how
    /// many were removed. Running jobs are left alone; the handler decides
    /// relevance at fire time.
    pub async fn cancel_matching(
        pool: &PgPool,
        name: &str,
        filter: &JsonValue,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM scheduled_jobs
            WHERE name = $1 AND state = 'pending' AND payload @> $2
            "#,
        )
        .bind(name)
        .bind(filter)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Claims due pending jobs for execution.
    ///
    /// Atomically transitions up to `limit` due jobs from pending to
    /// running and returns them. Concurrent workers skip each other's rows.
    pub async fn claim_due(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let jobs = sqlx::query_as::<_, ScheduledJob>(&format!(
            r#"
            WITH due_jobs AS (
                SELECT id
                FROM scheduled_jobs
                WHERE state = $1 AND run_at <= NOW()
                ORDER BY run_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE scheduled_jobs
            SET state = $3, updated_at = NOW()
            FROM due_jobs
            WHERE scheduled_jobs.id = due_jobs.id
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(JobState::Pending)
        .bind(limit)
        .bind(JobState::Running)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    /// Marks a running job as succeeded. Returns `false` if the job was not
    /// in the running state.
    pub async fn mark_succeeded(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_jobs
            SET state = $2, updated_at = NOW()
            WHERE id = $1 AND state = $3
            "#,
        )
        .bind(id)
        .bind(JobState::Succeeded)
        .bind(JobState::Running)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks a running job as failed with an error message.
    pub async fn mark_failed(
        pool: &PgPool,
        id: Uuid,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_jobs
            SET state = $2, updated_at = NOW(), error = $3
            WHERE id = $1 AND state = $4
            "#,
        )
        .bind(id)
        .bind(JobState::Failed)
        .bind(error)
        .bind(JobState::Running)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns jobs stuck in the running state back to pending.
    ///
    /// Called at worker startup: rows left running belong to a previous
    /// process that died mid-execution.
    pub async fn release_stuck(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_jobs
            SET state = $1, updated_at = NOW()
            WHERE state = $2
            "#,
        )
        .bind(JobState::Pending)
        .bind(JobState::Running)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts jobs currently pending.
    pub async fn pending_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM scheduled_jobs WHERE state = $1")
                .bind(JobState::Pending)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_as_str() {
        assert_eq!(JobState::Pending.as_str(), "pending");
        assert_eq!(JobState::Running.as_str(), "running");
        assert_eq!(JobState::Succeeded.as_str(), "succeeded");
        assert_eq!(JobState::Failed.as_str(), "failed");
    }

    #[test]
    fn test_state_serde() {
        let state: JobState = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(state, JobState::Pending);
        assert!(serde_json::from_str::<JobState>("\"cancelled\"").is_err());
    }

    // Integration tests for claim/cancel semantics are in tests/ and
    // require a running database
}
