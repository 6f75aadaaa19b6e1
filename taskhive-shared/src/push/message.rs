/// Notification message composition
///
/// Builds the title/body pair for the two task notification kinds. Kept
/// free of I/O so the wording rules stay unit-testable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a notification is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    /// Task was assigned to the user
    Assigned,
    /// Task's due time is one hour away
    EtaReminder,
}

impl NotifyKind {
    /// Converts kind to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyKind::Assigned => "assigned",
            NotifyKind::EtaReminder => "eta_reminder",
        }
    }

    /// Parses a kind from its wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assigned" => Some(NotifyKind::Assigned),
            "eta_reminder" => Some(NotifyKind::EtaReminder),
            _ => None,
        }
    }
}

/// Task metadata attached to a push so the app can deep-link to the task.
///
/// Direct sends (admin broadcast) carry no task reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRef {
    pub task_id: Uuid,
    pub kind: NotifyKind,
}

/// A composed push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

impl PushMessage {
    /// Composes the notification for a task.
    ///
    /// The title is prefixed with the kind; an empty task title falls back
    /// to a generic one. The body is the task description when present,
    /// otherwise a kind-specific default.
    pub fn compose(kind: NotifyKind, task_title: &str, description: Option<&str>) -> Self {
        let title = match kind {
            NotifyKind::Assigned => {
                if task_title.is_empty() {
                    "Task Assigned".to_string()
                } else {
                    format!("Assigned: {}", task_title)
                }
            }
            NotifyKind::EtaReminder => {
                if task_title.is_empty() {
                    "Task Reminder".to_string()
                } else {
                    format!("Reminder: {}", task_title)
                }
            }
        };

        let body = description
            .filter(|d| !d.is_empty())
            .unwrap_or(match kind {
                NotifyKind::Assigned => "You have been assigned a new task.",
                NotifyKind::EtaReminder => "Your task ETA is approaching.",
            })
            .to_string();

        PushMessage { title, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [NotifyKind::Assigned, NotifyKind::EtaReminder] {
            assert_eq!(NotifyKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotifyKind::parse("completed"), None);
    }

    #[test]
    fn test_kind_serde_wire_strings() {
        assert_eq!(serde_json::to_string(&NotifyKind::Assigned).unwrap(), "\"assigned\"");
        assert_eq!(
            serde_json::to_string(&NotifyKind::EtaReminder).unwrap(),
            "\"eta_reminder\""
        );
    }

    #[test]
    fn test_compose_assigned() {
        let msg = PushMessage::compose(NotifyKind::Assigned, "Ship report", Some("Q3 numbers"));
        assert_eq!(msg.title, "Assigned: Ship report");
        assert_eq!(msg.body, "Q3 numbers");
    }

    #[test]
    fn test_compose_assigned_defaults() {
        let msg = PushMessage::compose(NotifyKind::Assigned, "", None);
        assert_eq!(msg.title, "Task Assigned");
        assert_eq!(msg.body, "You have been assigned a new task.");
    }

    #[test]
    fn test_compose_reminder() {
        let msg = PushMessage::compose(NotifyKind::EtaReminder, "Ship report", None);
        assert_eq!(msg.title, "Reminder: Ship report");
        assert_eq!(msg.body, "Your task ETA is approaching.");
    }

    #[test]
    fn test_compose_empty_description_falls_back() {
        let msg = PushMessage::compose(NotifyKind::EtaReminder, "Ship report", Some(""));
        assert_eq!(msg.body, "Your task ETA is approaching.");
    }
}
