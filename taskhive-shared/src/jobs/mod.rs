/// Background job definitions
///
/// Job names, payload shapes and scheduling rules shared by the API (which
/// enqueues) and the worker (which claims and runs). Every task push goes
/// through the `task-notify` job, immediate for assignment notices and
/// scheduled for ETA reminders, so delivery survives restarts and is
/// re-checked against current task state at fire time.

pub mod reminder;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

pub use crate::push::message::NotifyKind;

/// Job name for task push notifications
pub const TASK_NOTIFY: &str = "task-notify";

/// Payload of a `task-notify` job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNotifyPayload {
    pub task_id: Uuid,

    #[serde(rename = "type")]
    pub kind: NotifyKind,
}

impl TaskNotifyPayload {
    pub fn new(task_id: Uuid, kind: NotifyKind) -> Self {
        Self { task_id, kind }
    }

    /// JSON form stored in `scheduled_jobs.payload`.
    pub fn to_json(&self) -> JsonValue {
        json!({ "task_id": self.task_id, "type": self.kind.as_str() })
    }
}

/// Containment filter matching every pending job for a task.
///
/// Used when a task is deleted; nothing queued for it should fire.
pub fn task_filter(task_id: Uuid) -> JsonValue {
    json!({ "task_id": task_id })
}

/// Containment filter matching only pending ETA reminders for a task.
///
/// Used on ETA changes, which must not cancel a queued assignment notice.
pub fn reminder_filter(task_id: Uuid) -> JsonValue {
    json!({ "task_id": task_id, "type": NotifyKind::EtaReminder.as_str() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let payload = TaskNotifyPayload::new(Uuid::new_v4(), NotifyKind::EtaReminder);

        let json = payload.to_json();
        assert_eq!(json["type"], "eta_reminder");

        let parsed: TaskNotifyPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_payload_serde_uses_type_key() {
        let payload = TaskNotifyPayload::new(Uuid::new_v4(), NotifyKind::Assigned);
        let value = serde_json::to_value(payload).unwrap();

        assert_eq!(value["type"], "assigned");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_reminder_filter_is_contained_in_reminder_payload() {
        let task_id = Uuid::new_v4();
        let payload = TaskNotifyPayload::new(task_id, NotifyKind::EtaReminder).to_json();
        let filter = reminder_filter(task_id);

        // Containment check mirrors the @> semantics used for cancellation
        let payload_map = payload.as_object().unwrap();
        for (key, value) in filter.as_object().unwrap() {
            assert_eq!(payload_map.get(key), Some(value));
        }
    }

    #[test]
    fn test_reminder_filter_does_not_match_assignment() {
        let task_id = Uuid::new_v4();
        let payload = TaskNotifyPayload::new(task_id, NotifyKind::Assigned).to_json();
        let filter = reminder_filter(task_id);

        assert_ne!(payload["type"], filter["type"]);
    }
}
