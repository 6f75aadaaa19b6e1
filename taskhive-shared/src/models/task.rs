/// Task model and database operations
///
/// Tasks are the heart of the system: creating or editing one triggers the
/// assigned-notification and reminder-scheduling side effects handled by the
/// task routes and the worker. This module only covers persistence; the
/// side-effect logic lives with the lifecycle handlers.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to do', 'in progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title TEXT NOT NULL,
///     description TEXT,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     eta TIMESTAMPTZ,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'to do',
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Ship report".to_string(),
///     description: None,
///     project_id,
///     assigned_to: None,
///     eta: None,
///     priority: TaskPriority::Medium,
///     status: TaskStatus::Todo,
///     created_by: None,
/// })
/// .await?;
///
/// assert_eq!(task.status, TaskStatus::Todo);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status.
///
/// The wire strings contain spaces ("to do", "in progress") — they are the
/// contract the clients already speak, and the Postgres enum labels match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    /// Not started
    #[serde(rename = "to do")]
    #[sqlx(rename = "to do")]
    Todo,

    /// Being worked on
    #[serde(rename = "in progress")]
    #[sqlx(rename = "in progress")]
    InProgress,

    /// Done; completed tasks no longer get ETA reminders
    #[serde(rename = "completed")]
    #[sqlx(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// Converts status to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "to do",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses a status from its wire string; `None` for anything outside
    /// the enumerated set (e.g. "archived")
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "to do" => Some(TaskStatus::Todo),
            "in progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Converts priority to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Parses a priority from its wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// A task row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub id: Uuid,

    /// Title, never empty
    pub title: String,

    /// Optional longer description; also the notification body when present
    pub description: Option<String>,

    /// Owning project
    pub project_id: Uuid,

    /// Assigned user (nullable; SET NULL if the user is deleted)
    pub assigned_to: Option<Uuid>,

    /// Due time; the reminder anchor
    pub eta: Option<DateTime<Utc>>,

    /// Priority, defaults to medium
    pub priority: TaskPriority,

    /// Workflow status, defaults to "to do"
    pub status: TaskStatus,

    /// User who created the task (nullable if the user is deleted)
    pub created_by: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub eta: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub created_by: Option<Uuid>,
}

/// Input for updating a task
///
/// Single-wrapped fields replace the value when present. Double-wrapped
/// fields distinguish "leave unchanged" (`None`) from "clear"
/// (`Some(None)`) for the nullable columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub project_id: Option<Uuid>,
    pub assigned_to: Option<Option<Uuid>>,
    pub eta: Option<Option<DateTime<Utc>>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
}

/// Filter for the records query; all present fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub task_id: Option<Uuid>,
}

/// A task with assignee/creator/project references expanded to display
/// fields, as returned by the records query.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub eta: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Assignee display name, when an assignee is set
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,

    /// Creator display name, when the creator still exists
    pub creator_name: Option<String>,
    pub creator_email: Option<String>,

    /// Owning project's name
    pub project_name: Option<String>,
}

const TASK_COLUMNS: &str = "id, title, description, project_id, assigned_to, eta, \
     priority, status, created_by, created_at, updated_at";

impl Task {
    /// Creates a new task.
    ///
    /// # Errors
    ///
    /// Fails with a foreign-key violation (`tasks_project_id_fkey`,
    /// `tasks_assigned_to_fkey`) when the referenced project or user does
    /// not exist, and with a check violation (`tasks_title_not_blank`) on a
    /// blank title.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, project_id, assigned_to, eta,
                               priority, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(data.title)
        .bind(data.description)
        .bind(data.project_id)
        .bind(data.assigned_to)
        .bind(data.eta)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update and returns the new row, or `None` if the
    /// task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.project_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", project_id = ${bind_count}"));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${bind_count}"));
        }
        if data.eta.is_some() {
            bind_count += 1;
            query.push_str(&format!(", eta = ${bind_count}"));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(project_id) = data.project_id {
            q = q.bind(project_id);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(eta) = data.eta {
            q = q.bind(eta);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task.
    ///
    /// The caller is responsible for cancelling any pending reminder jobs.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Runs the records query: AND-combined filters, newest first, with
    /// assignee/creator/project expanded to display fields.
    pub async fn find_records(
        pool: &PgPool,
        filter: TaskFilter,
    ) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let mut query = String::from(
            r#"
            SELECT t.id, t.title, t.description, t.project_id, t.assigned_to, t.eta,
                   t.priority, t.status, t.created_by, t.created_at, t.updated_at,
                   ua.full_name AS assignee_name, ua.email AS assignee_email,
                   uc.full_name AS creator_name, uc.email AS creator_email,
                   p.name AS project_name
            FROM tasks t
            LEFT JOIN users ua ON ua.id = t.assigned_to
            LEFT JOIN users uc ON uc.id = t.created_by
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE TRUE
            "#,
        );
        let mut bind_count = 0;

        if filter.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.assigned_to = ${bind_count}"));
        }
        if filter.created_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.created_by = ${bind_count}"));
        }
        if filter.project_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.project_id = ${bind_count}"));
        }
        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.status = ${bind_count}"));
        }
        if filter.task_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.id = ${bind_count}"));
        }

        query.push_str(" ORDER BY t.created_at DESC");

        let mut q = sqlx::query_as::<_, TaskRecord>(&query);

        if let Some(assigned_to) = filter.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(created_by) = filter.created_by {
            q = q.bind(created_by);
        }
        if let Some(project_id) = filter.project_id {
            q = q.bind(project_id);
        }
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(task_id) = filter.task_id {
            q = q.bind(task_id);
        }

        let records = q.fetch_all(pool).await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "to do");
        assert_eq!(TaskStatus::InProgress.as_str(), "in progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!(TaskStatus::parse("archived"), None);
        assert_eq!(TaskStatus::parse("todo"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn test_status_serde_wire_strings() {
        let status: TaskStatus = serde_json::from_str("\"to do\"").unwrap();
        assert_eq!(status, TaskStatus::Todo);
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in progress\"");
        assert!(serde_json::from_str::<TaskStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(TaskPriority::parse("low"), Some(TaskPriority::Low));
        assert_eq!(TaskPriority::parse("medium"), Some(TaskPriority::Medium));
        assert_eq!(TaskPriority::parse("high"), Some(TaskPriority::High));
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_update_task_default_changes_nothing() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.assigned_to.is_none());
        assert!(update.eta.is_none());
        assert!(update.status.is_none());
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
