/// Task notification handler
///
/// Delivers the `task-notify` jobs the API queues: immediate assignment
/// notices and ETA reminders scheduled an hour ahead. The payload only
/// carries the task id and kind; everything else is re-resolved at fire
/// time, so a task deleted, reassigned, completed, or re-scheduled after
/// the job was queued is handled by skipping rather than by a stale push.
///
/// Skips are successes: the job did its work by observing there is
/// nothing left to deliver. Only provider and database failures mark the
/// job failed.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use taskhive_shared::jobs::{reminder::reminder_at, NotifyKind, TaskNotifyPayload, TASK_NOTIFY};
use taskhive_shared::models::scheduled_job::ScheduledJob;
use taskhive_shared::models::task::{Task, TaskStatus};
use taskhive_shared::models::user::User;
use taskhive_shared::push::message::{PushMessage, TaskRef};
use taskhive_shared::push::{PushOutcome, Pusher};

use super::{HandlerError, JobHandler};

/// Handler for `task-notify` jobs
pub struct TaskNotifyHandler {
    pusher: Pusher,
}

impl TaskNotifyHandler {
    pub fn new(pusher: Pusher) -> Self {
        Self { pusher }
    }
}

/// Whether a claimed reminder still matches the task it was queued for.
///
/// False once the task is completed, the ETA was cleared, or the ETA moved
/// so the stored run time no longer equals `eta - 1h`.
fn reminder_still_relevant(task: &Task, run_at: DateTime<Utc>) -> bool {
    if task.status == TaskStatus::Completed {
        return false;
    }

    match task.eta {
        Some(eta) => reminder_at(eta) == run_at,
        None => false,
    }
}

#[async_trait]
impl JobHandler for TaskNotifyHandler {
    fn name(&self) -> &'static str {
        TASK_NOTIFY
    }

    async fn handle(&self, db: &PgPool, job: &ScheduledJob) -> Result<(), HandlerError> {
        let payload: TaskNotifyPayload = serde_json::from_value(job.payload.clone())?;

        let Some(task) = Task::find_by_id(db, payload.task_id).await? else {
            tracing::info!(task_id = %payload.task_id, "Task is gone, skipping notification");
            return Ok(());
        };

        let Some(assignee_id) = task.assigned_to else {
            tracing::info!(task_id = %task.id, "Task has no assignee, skipping notification");
            return Ok(());
        };

        let Some(assignee) = User::find_by_id(db, assignee_id).await? else {
            tracing::info!(
                task_id = %task.id,
                user_id = %assignee_id,
                "Assignee is gone, skipping notification"
            );
            return Ok(());
        };

        if payload.kind == NotifyKind::EtaReminder && !reminder_still_relevant(&task, job.run_at) {
            tracing::info!(
                task_id = %task.id,
                run_at = %job.run_at,
                "Reminder no longer matches the task, skipping"
            );
            return Ok(());
        }

        let message = PushMessage::compose(payload.kind, &task.title, task.description.as_deref());
        let task_ref = TaskRef {
            task_id: task.id,
            kind: payload.kind,
        };

        match self
            .pusher
            .notify_user(&assignee, &message, Some(task_ref))
            .await?
        {
            PushOutcome::Sent(channel) => {
                tracing::info!(
                    task_id = %task.id,
                    user_id = %assignee.id,
                    channel = %channel.as_str(),
                    kind = %payload.kind.as_str(),
                    "Notification delivered"
                );
            }
            PushOutcome::NoDeviceToken => {
                // No registered device is a quiet outcome on this path
                tracing::info!(
                    task_id = %task.id,
                    user_id = %assignee.id,
                    "Assignee has no device token, nothing to deliver"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use taskhive_shared::models::task::TaskPriority;
    use uuid::Uuid;

    fn sample_task(status: TaskStatus, eta: Option<DateTime<Utc>>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Ship the release".to_string(),
            description: None,
            project_id: Uuid::new_v4(),
            assigned_to: Some(Uuid::new_v4()),
            eta,
            priority: TaskPriority::Medium,
            status,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reminder_relevant_when_run_time_matches() {
        let eta = Utc::now() + Duration::hours(2);
        let task = sample_task(TaskStatus::Todo, Some(eta));

        assert!(reminder_still_relevant(&task, eta - Duration::hours(1)));
    }

    #[test]
    fn test_reminder_stale_after_eta_move() {
        let eta = Utc::now() + Duration::hours(2);
        let task = sample_task(TaskStatus::Todo, Some(eta + Duration::hours(1)));

        // Job was queued for the old eta
        assert!(!reminder_still_relevant(&task, eta - Duration::hours(1)));
    }

    #[test]
    fn test_reminder_stale_after_completion() {
        let eta = Utc::now() + Duration::hours(2);
        let task = sample_task(TaskStatus::Completed, Some(eta));

        assert!(!reminder_still_relevant(&task, eta - Duration::hours(1)));
    }

    #[test]
    fn test_reminder_stale_after_eta_cleared() {
        let eta = Utc::now() + Duration::hours(2);
        let task = sample_task(TaskStatus::InProgress, None);

        assert!(!reminder_still_relevant(&task, eta - Duration::hours(1)));
    }

    #[test]
    fn test_handler_name_matches_job() {
        let handler = TaskNotifyHandler::new(Pusher::disabled());
        assert_eq!(handler.name(), TASK_NOTIFY);
    }

    // Delivery against queued rows is covered in tests/ and requires a
    // running database
}
