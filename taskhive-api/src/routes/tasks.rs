/// Task endpoints
///
/// The task lifecycle drives the notification pipeline: creating or
/// reassigning a task queues an immediate `task-notify` job for the
/// assignee, and an ETA queues a reminder job at exactly one hour before
/// it. Jobs live in the `scheduled_jobs` table and are delivered by the
/// worker, so a push provider outage never fails an API request.
///
/// Reminder bookkeeping keeps at most one active reminder per task: any
/// ETA change first cancels the pending reminder, then schedules a fresh
/// one only when the new `eta - 1h` still lies in the future.
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create a task
/// - `GET /v1/tasks/records` - Query tasks with filters
/// - `PUT /v1/tasks/update-status` - Update status/priority only
/// - `PUT /v1/tasks/:id` - Update a task
/// - `DELETE /v1/tasks/:id` - Delete a task
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use taskhive_shared::{
    auth::middleware::AuthContext,
    jobs::{
        reminder::{plan_for_create, plan_for_update, ReminderPlan},
        reminder_filter, task_filter, NotifyKind, TaskNotifyPayload, TASK_NOTIFY,
    },
    models::{
        scheduled_job::ScheduledJob,
        task::{CreateTask, Task, TaskFilter, TaskPriority, TaskRecord, TaskStatus},
    },
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, DataEnvelope, TaskEnvelope},
    routes::{double_option, parse_id, Json},
};

/// Create task request
///
/// Required fields are modeled as `Option` so their absence produces the
/// enveloped 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub assigned_to: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Update task request
///
/// `description`, `assigned_to`, and `eta` distinguish an absent field
/// (leave unchanged) from an explicit `null` (clear the value).
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub project_id: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub eta: Option<Option<DateTime<Utc>>>,

    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Query parameters for the status endpoint
#[derive(Debug, Deserialize)]
pub struct UpdateStatusQuery {
    pub task_id: String,
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Query parameters for task records
#[derive(Debug, Deserialize)]
pub struct TaskRecordsQuery {
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub task_id: Option<String>,
}

fn require_title(title: Option<&str>) -> Result<String, ApiError> {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(ApiError::BadRequest("Title is required".to_string())),
    }
}

fn parse_status(value: &str) -> Result<TaskStatus, ApiError> {
    TaskStatus::parse(value)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {}", value)))
}

fn parse_priority(value: &str) -> Result<TaskPriority, ApiError> {
    TaskPriority::parse(value)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid priority: {}", value)))
}

/// Queues an immediate assigned-notification job for a task.
async fn enqueue_assigned(pool: &PgPool, task_id: Uuid) -> Result<(), sqlx::Error> {
    let payload = TaskNotifyPayload::new(task_id, NotifyKind::Assigned);
    ScheduledJob::schedule(pool, TASK_NOTIFY, Utc::now(), payload.to_json()).await?;

    Ok(())
}

/// Queues a reminder job at the given fire time.
async fn enqueue_reminder(
    pool: &PgPool,
    task_id: Uuid,
    run_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let payload = TaskNotifyPayload::new(task_id, NotifyKind::EtaReminder);
    ScheduledJob::schedule(pool, TASK_NOTIFY, run_at, payload.to_json()).await?;

    Ok(())
}

/// Create a task
///
/// Persists the task with the bearer identity recorded as its creator,
/// responds `201` with it echoed, then queues the notification side
/// effects on a spawned background task: an immediate assigned job when
/// an assignee is set, and a reminder job when `eta - 1h` is still in
/// the future.
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks
/// Authorization: Bearer <token>
///
/// {
///   "title": "Ship the release",
///   "project_id": "uuid",
///   "assigned_to": "uuid",
///   "eta": "2025-07-01T12:00:00Z",
///   "priority": "high"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "task": { "id": "uuid", "title": "Ship the release", ... } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing title, missing/malformed IDs, invalid
///   status or priority
/// - `404 Not Found`: Unknown project or assignee
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskEnvelope<Task>>)> {
    let title = require_title(req.title.as_deref())?;

    let project_id = match req.project_id.as_deref() {
        Some(raw) => parse_id(raw, "project")?,
        None => return Err(ApiError::BadRequest("Project id is required".to_string())),
    };

    let assigned_to = match req.assigned_to.as_deref() {
        Some(raw) => Some(parse_id(raw, "user")?),
        None => None,
    };

    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => TaskStatus::default(),
    };

    let priority = match req.priority.as_deref() {
        Some(raw) => parse_priority(raw)?,
        None => TaskPriority::default(),
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            description: req.description,
            project_id,
            assigned_to,
            eta: req.eta,
            priority,
            status,
            created_by: Some(auth.user_id),
        },
    )
    .await?;

    // Fire-and-forget: enqueue failures are logged, never returned
    let db = state.db.clone();
    let task_id = task.id;
    let task_eta = task.eta;
    let has_assignee = task.assigned_to.is_some();
    tokio::spawn(async move {
        if has_assignee {
            if let Err(err) = enqueue_assigned(&db, task_id).await {
                tracing::error!(task_id = %task_id, error = %err, "Failed to queue assigned notification");
            }
        }

        if let Some(run_at) = plan_for_create(task_eta, Utc::now()) {
            if let Err(err) = enqueue_reminder(&db, task_id, run_at).await {
                tracing::error!(task_id = %task_id, error = %err, "Failed to queue reminder");
            }
        }
    });

    Ok(response::created_task(task))
}

/// Update a task
///
/// Applies a partial update; an explicit `null` clears `description`,
/// `assigned_to`, or `eta`. Side effects run after the write: a changed
/// assignee queues an immediate notification for the new assignee, and a
/// changed ETA cancels the pending reminder before scheduling a fresh one
/// when the new fire time is still in the future. Side-effect failures
/// are logged, never surfaced.
///
/// # Errors
///
/// - `400 Bad Request`: Missing title, malformed IDs, invalid status or
///   priority
/// - `404 Not Found`: Unknown task
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskEnvelope<Task>>> {
    let task_id = parse_id(&id, "task")?;

    let prior = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let title = require_title(req.title.as_deref())?;

    let project_id = match req.project_id.as_deref() {
        Some(raw) => Some(parse_id(raw, "project")?),
        None => None,
    };

    let assigned_to = match req.assigned_to {
        Some(Some(raw)) => Some(Some(parse_id(&raw, "user")?)),
        Some(None) => Some(None),
        None => None,
    };

    let status = match req.status.as_deref() {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };

    let priority = match req.priority.as_deref() {
        Some(raw) => Some(parse_priority(raw)?),
        None => None,
    };

    let update = taskhive_shared::models::task::UpdateTask {
        title: Some(title),
        description: req.description,
        project_id,
        assigned_to,
        eta: req.eta,
        priority,
        status,
    };

    let task = Task::update(&state.db, task_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    // Assignee changed to someone: notify the new assignee only
    if task.assigned_to != prior.assigned_to && task.assigned_to.is_some() {
        if let Err(err) = enqueue_assigned(&state.db, task.id).await {
            tracing::error!(task_id = %task.id, error = %err, "Failed to queue assigned notification");
        }
    }

    match plan_for_update(prior.eta, req.eta, Utc::now()) {
        ReminderPlan::Unchanged => {}
        ReminderPlan::Reschedule { at } => {
            if let Err(err) =
                ScheduledJob::cancel_matching(&state.db, TASK_NOTIFY, &reminder_filter(task.id))
                    .await
            {
                tracing::error!(task_id = %task.id, error = %err, "Failed to cancel reminder");
            }

            if let Some(run_at) = at {
                if let Err(err) = enqueue_reminder(&state.db, task.id, run_at).await {
                    tracing::error!(task_id = %task.id, error = %err, "Failed to queue reminder");
                }
            }
        }
    }

    Ok(response::ok_task(task))
}

/// Update only a task's status and priority
///
/// Both values arrive as query parameters and are validated against the
/// enumerated sets; anything outside them (e.g. `status=archived`) is a
/// 400 with no write. No reminder interaction.
///
/// # Endpoint
///
/// ```text
/// PUT /v1/tasks/update-status?task_id=<uuid>&status=completed&priority=low
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed ID, invalid status or priority, or
///   neither field provided
/// - `404 Not Found`: Unknown task
pub async fn update_status(
    State(state): State<AppState>,
    Query(query): Query<UpdateStatusQuery>,
) -> ApiResult<Json<TaskEnvelope<Task>>> {
    let task_id = parse_id(&query.task_id, "task")?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };

    let priority = match query.priority.as_deref() {
        Some(raw) => Some(parse_priority(raw)?),
        None => None,
    };

    if status.is_none() && priority.is_none() {
        return Err(ApiError::BadRequest(
            "Status or priority is required".to_string(),
        ));
    }

    let update = taskhive_shared::models::task::UpdateTask {
        title: None,
        description: None,
        project_id: None,
        assigned_to: None,
        eta: None,
        priority,
        status,
    };

    let task = Task::update(&state.db, task_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(response::ok_task(task))
}

/// Delete a task
///
/// Removes the task and cancels its pending notification jobs so a
/// deleted task never produces a reminder.
///
/// # Errors
///
/// - `404 Not Found`: Unknown task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataEnvelope<Task>>> {
    let task_id = parse_id(&id, "task")?;

    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let deleted = Task::delete(&state.db, task_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    // The worker also skips jobs whose task is gone, so a cancel failure
    // here is log-only
    if let Err(err) = ScheduledJob::cancel_matching(&state.db, TASK_NOTIFY, &task_filter(task_id)).await
    {
        tracing::error!(task_id = %task_id, error = %err, "Failed to cancel notification jobs");
    }

    Ok(response::ok(task))
}

/// Query tasks with filters
///
/// Filters combine with AND; results are newest-first with assignee,
/// creator, and project expanded via joins.
///
/// # Endpoint
///
/// ```text
/// GET /v1/tasks/records?project_id=<uuid>&status=in%20progress
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed ID or invalid status
pub async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<TaskRecordsQuery>,
) -> ApiResult<Json<DataEnvelope<Vec<TaskRecord>>>> {
    let mut filter = TaskFilter::default();

    if let Some(raw) = query.assigned_to.as_deref() {
        filter.assigned_to = Some(parse_id(raw, "user")?);
    }
    if let Some(raw) = query.created_by.as_deref() {
        filter.created_by = Some(parse_id(raw, "user")?);
    }
    if let Some(raw) = query.project_id.as_deref() {
        filter.project_id = Some(parse_id(raw, "project")?);
    }
    if let Some(raw) = query.status.as_deref() {
        filter.status = Some(parse_status(raw)?);
    }
    if let Some(raw) = query.task_id.as_deref() {
        filter.task_id = Some(parse_id(raw, "task")?);
    }

    let records = Task::find_records(&state.db, filter).await?;

    Ok(response::ok(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_title() {
        assert_eq!(require_title(Some("Ship it")).unwrap(), "Ship it");
        assert_eq!(require_title(Some("  padded  ")).unwrap(), "padded");

        assert!(require_title(None).is_err());
        assert!(require_title(Some("")).is_err());
        assert!(require_title(Some("   ")).is_err());
    }

    #[test]
    fn test_parse_status_rejects_archived() {
        assert_eq!(parse_status("to do").unwrap(), TaskStatus::Todo);
        assert_eq!(parse_status("in progress").unwrap(), TaskStatus::InProgress);
        assert_eq!(parse_status("completed").unwrap(), TaskStatus::Completed);

        let err = parse_status("archived").unwrap_err();
        match err {
            ApiError::BadRequest(msg) => assert!(msg.contains("archived")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!(parse_priority("high").unwrap(), TaskPriority::High);
        assert!(parse_priority("urgent").is_err());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{ "title": "Ship it", "eta": null }"#).unwrap();
        assert_eq!(req.eta, Some(None));
        assert!(req.assigned_to.is_none());

        let req: UpdateTaskRequest = serde_json::from_str(
            r#"{ "title": "Ship it", "eta": "2025-07-01T12:00:00Z" }"#,
        )
        .unwrap();
        assert!(matches!(req.eta, Some(Some(_))));
    }

    // Lifecycle flows (create queues jobs, eta change reschedules, delete
    // cancels) are covered in tests/ and require a running database
}
