/// Integration tests for the TaskHive API
///
/// These tests verify the task lifecycle end-to-end against a real
/// database:
/// - Create/update validation and the response envelope
/// - Reminder scheduling at exactly `eta - 1h`
/// - Cancel-then-reschedule on ETA changes
/// - Job cancellation on task deletion
/// - The worker runner claiming and marking jobs
///
/// All tests require a running PostgreSQL (`TEST_DATABASE_URL`) and are
/// ignored by default:
///
/// ```bash
/// cargo test -p taskhive-api -- --ignored
/// ```
mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde_json::json;
use tower::ServiceExt as _;

use taskhive_shared::models::scheduled_job::{JobState, ScheduledJob};
use taskhive_shared::models::task::Task;
use taskhive_worker::handlers::mock::MockHandler;
use taskhive_worker::runner::{Runner, RunnerConfig};

use common::{wait_for, TaskSeed, TestContext};

/// Now at whole-second precision; Postgres stores microseconds, so exact
/// `run_at` comparisons need the nanoseconds gone.
fn now_rounded() -> DateTime<Utc> {
    Utc::now().with_nanosecond(0).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_task(ctx: &TestContext, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn put_task(ctx: &TestContext, task_id: uuid::Uuid, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

/// Creating a task with a far ETA queues exactly one reminder at `eta - 1h`
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_task_schedules_reminder() {
    let ctx = TestContext::new().await.unwrap();

    let eta = now_rounded() + Duration::hours(2);
    let response = ctx
        .app
        .clone()
        .oneshot(post_task(
            &ctx,
            json!({
                "title": "Ship report",
                "project_id": ctx.project.id,
                "assigned_to": ctx.user.id,
                "eta": eta,
                "status": "to do",
                "priority": "medium"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["task"]["title"], "Ship report");

    let task_id: uuid::Uuid = body["task"]["id"].as_str().unwrap().parse().unwrap();

    // Side effects run on a spawned task; poll until both jobs exist
    wait_for(
        || async { ctx.pending_jobs_for_task(task_id).await.unwrap().len() == 2 },
        5,
    )
    .await
    .unwrap();

    let jobs = ctx.pending_jobs_for_task(task_id).await.unwrap();
    let reminder = jobs
        .iter()
        .find(|job| job.payload["type"] == "eta_reminder")
        .expect("reminder job queued");
    assert_eq!(reminder.run_at, eta - Duration::hours(1));

    // The assignment notice is immediate
    let assigned = jobs
        .iter()
        .find(|job| job.payload["type"] == "assigned")
        .expect("assigned job queued");
    assert!(assigned.run_at <= Utc::now());

    ctx.cleanup().await.unwrap();
}

/// An ETA closer than the reminder lead produces no reminder job
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_task_with_near_eta_schedules_nothing() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(post_task(
            &ctx,
            json!({
                "title": "Quick fix",
                "project_id": ctx.project.id,
                "eta": Utc::now() + Duration::minutes(30)
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let task_id: uuid::Uuid = body["task"]["id"].as_str().unwrap().parse().unwrap();

    // Give the spawned side effects time to run, then confirm silence
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    assert!(ctx.pending_jobs_for_task(task_id).await.unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

/// A blank title is a 400 and no task row is written
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_task_without_title_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(post_task(
            &ctx,
            json!({ "title": "", "project_id": ctx.project.id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
        .bind(ctx.project.id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count.0, 0);

    ctx.cleanup().await.unwrap();
}

/// A malformed project id is rejected before any lookup
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_task_with_malformed_project_id_is_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(post_task(
            &ctx,
            json!({ "title": "Ship report", "project_id": "not-a-uuid" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// A body field that fails to deserialize is a 400 in the failure envelope
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_task_with_malformed_eta_gets_enveloped_400() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(post_task(
            &ctx,
            json!({
                "title": "Ship report",
                "project_id": ctx.project.id,
                "eta": "not-a-date"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "bad_request");

    ctx.cleanup().await.unwrap();
}

/// The bearer identity is recorded as the creator and queryable by filter
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_create_task_records_creator() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(post_task(
            &ctx,
            json!({ "title": "Ship report", "project_id": ctx.project.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["task"]["created_by"], json!(ctx.user.id));

    let records_for = |user_id: uuid::Uuid| {
        Request::builder()
            .method("GET")
            .uri(format!("/v1/tasks/records?created_by={}", user_id))
            .header("authorization", ctx.auth_header())
            .body(Body::empty())
            .unwrap()
    };

    let response = ctx
        .app
        .clone()
        .oneshot(records_for(ctx.user.id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "Ship report");
    assert_eq!(records[0]["creator_name"], "Test User");
    assert_eq!(records[0]["creator_email"], ctx.user.email);

    // A different creator matches nothing
    let other = ctx.create_user("Someone Else").await.unwrap();
    let response = ctx
        .app
        .clone()
        .oneshot(records_for(other.id))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    ctx.cleanup().await.unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(other.id)
        .execute(&ctx.db)
        .await
        .unwrap();
}

/// Updating the ETA twice with the same value leaves exactly one reminder
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_update_eta_reschedules_idempotently() {
    let ctx = TestContext::new().await.unwrap();

    let task = ctx
        .create_task("Ship report", TaskSeed::default())
        .await
        .unwrap();

    let eta = now_rounded() + Duration::hours(3);
    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(put_task(
                &ctx,
                task.id,
                json!({ "title": "Ship report", "eta": eta }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let jobs = ctx.pending_jobs_for_task(task.id).await.unwrap();
    assert_eq!(jobs.len(), 1, "exactly one reminder after repeated update");
    assert_eq!(jobs[0].payload["type"], "eta_reminder");
    assert_eq!(jobs[0].run_at, eta - Duration::hours(1));

    ctx.cleanup().await.unwrap();
}

/// Moving the ETA inside the lead window cancels without rescheduling
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_update_eta_to_near_future_cancels_reminder() {
    let ctx = TestContext::new().await.unwrap();

    let task = ctx
        .create_task("Ship report", TaskSeed::default())
        .await
        .unwrap();

    // First update queues a reminder
    let far = Utc::now() + Duration::hours(2);
    ctx.app
        .clone()
        .oneshot(put_task(
            &ctx,
            task.id,
            json!({ "title": "Ship report", "eta": far }),
        ))
        .await
        .unwrap();
    assert_eq!(ctx.pending_jobs_for_task(task.id).await.unwrap().len(), 1);

    // Second update moves the ETA to 30 minutes out; eta - 1h is in the past
    let near = Utc::now() + Duration::minutes(30);
    let response = ctx
        .app
        .clone()
        .oneshot(put_task(
            &ctx,
            task.id,
            json!({ "title": "Ship report", "eta": near }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(ctx.pending_jobs_for_task(task.id).await.unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

/// Changing the assignee queues exactly one assignment notice
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_assignee_change_queues_one_notification() {
    let ctx = TestContext::new().await.unwrap();
    let assignee = ctx.create_user("New Assignee").await.unwrap();

    let task = ctx
        .create_task("Ship report", TaskSeed::default())
        .await
        .unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(put_task(
            &ctx,
            task.id,
            json!({ "title": "Ship report", "assigned_to": assignee.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let jobs = ctx.pending_jobs_for_task(task.id).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload["type"], "assigned");

    // Same assignee again queues nothing new
    let response = ctx
        .app
        .clone()
        .oneshot(put_task(
            &ctx,
            task.id,
            json!({ "title": "Ship report", "assigned_to": assignee.id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.pending_jobs_for_task(task.id).await.unwrap().len(), 1);

    ctx.cleanup().await.unwrap();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(assignee.id)
        .execute(&ctx.db)
        .await
        .unwrap();
}

/// A status outside the enumerated set is a 400 and the task is unchanged
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_update_status_rejects_unknown_value() {
    let ctx = TestContext::new().await.unwrap();

    let task = ctx
        .create_task("Ship report", TaskSeed::default())
        .await
        .unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/v1/tasks/update-status?task_id={}&status=archived",
            task.id
        ))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unchanged = Task::find_by_id(&ctx.db, task.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, task.status);

    ctx.cleanup().await.unwrap();
}

/// Deleting a task cancels its pending notification jobs
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_delete_task_cancels_pending_jobs() {
    let ctx = TestContext::new().await.unwrap();

    let task = ctx
        .create_task("Ship report", TaskSeed::default())
        .await
        .unwrap();

    ctx.app
        .clone()
        .oneshot(put_task(
            &ctx,
            task.id,
            json!({ "title": "Ship report", "eta": Utc::now() + Duration::hours(4) }),
        ))
        .await
        .unwrap();
    assert_eq!(ctx.pending_jobs_for_task(task.id).await.unwrap().len(), 1);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/tasks/{}", task.id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(Task::find_by_id(&ctx.db, task.id).await.unwrap().is_none());
    assert!(ctx.pending_jobs_for_task(task.id).await.unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

/// Task endpoints require a bearer token
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "title": "Ship report", "project_id": ctx.project.id }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// The runner claims a due job, hands it to its handler, and marks it
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_runner_executes_due_job() {
    let ctx = TestContext::new().await.unwrap();

    let job = ScheduledJob::schedule(
        &ctx.db,
        "mock",
        Utc::now() - Duration::seconds(1),
        json!({ "kind": "runner-test" }),
    )
    .await
    .unwrap();

    let handler = Arc::new(MockHandler::new());
    let mut runner = Runner::new(
        ctx.db.clone(),
        RunnerConfig {
            poll_interval_secs: 1,
            batch_size: 5,
            max_concurrent: 2,
        },
    );
    runner.register(handler.clone());

    let shutdown = runner.shutdown_token();
    let worker_handle = tokio::spawn(async move { runner.run().await });

    wait_for(
        || async {
            let row = ScheduledJob::find_by_id(&ctx.db, job.id).await.unwrap();
            matches!(row, Some(job) if job.state == JobState::Succeeded)
        },
        10,
    )
    .await
    .unwrap();

    assert_eq!(handler.handled(), 1);
    assert_eq!(handler.seen(), vec![job.id]);

    shutdown.cancel();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), worker_handle).await;

    sqlx::query("DELETE FROM scheduled_jobs WHERE id = $1")
        .bind(job.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}

/// A handler error marks the job failed with the error text recorded
#[tokio::test]
#[ignore = "requires a running PostgreSQL (TEST_DATABASE_URL)"]
async fn test_runner_marks_failed_job() {
    let ctx = TestContext::new().await.unwrap();

    let job = ScheduledJob::schedule(
        &ctx.db,
        "mock",
        Utc::now() - Duration::seconds(1),
        json!({ "kind": "runner-failure-test" }),
    )
    .await
    .unwrap();

    let mut runner = Runner::new(
        ctx.db.clone(),
        RunnerConfig {
            poll_interval_secs: 1,
            batch_size: 5,
            max_concurrent: 2,
        },
    );
    runner.register(Arc::new(MockHandler::failing("simulated provider outage")));

    let shutdown = runner.shutdown_token();
    let worker_handle = tokio::spawn(async move { runner.run().await });

    wait_for(
        || async {
            let row = ScheduledJob::find_by_id(&ctx.db, job.id).await.unwrap();
            matches!(row, Some(job) if job.state == JobState::Failed)
        },
        10,
    )
    .await
    .unwrap();

    let failed = ScheduledJob::find_by_id(&ctx.db, job.id)
        .await
        .unwrap()
        .unwrap();
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("simulated provider outage"));

    shutdown.cancel();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), worker_handle).await;

    sqlx::query("DELETE FROM scheduled_jobs WHERE id = $1")
        .bind(job.id)
        .execute(&ctx.db)
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}
