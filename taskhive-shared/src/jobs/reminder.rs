/// ETA reminder planning
///
/// Pure rules for when a reminder job should exist. A reminder fires one
/// hour before a task's ETA and is only ever scheduled for a strictly
/// future instant; an ETA too near or in the past produces no reminder
/// rather than one that fires immediately.
use chrono::{DateTime, Duration, Utc};

/// Hours before the ETA that the reminder fires
const REMINDER_LEAD_HOURS: i64 = 1;

/// The instant a reminder for this ETA fires.
pub fn reminder_at(eta: DateTime<Utc>) -> DateTime<Utc> {
    eta - Duration::hours(REMINDER_LEAD_HOURS)
}

/// Reminder to schedule for a newly created task, if any.
///
/// Returns the fire time only when it is strictly after `now`.
pub fn plan_for_create(eta: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    eta.map(reminder_at).filter(|at| *at > now)
}

/// What an update does to a task's pending reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPlan {
    /// ETA untouched; leave any pending reminder alone
    Unchanged,

    /// Cancel pending reminders, then schedule at the given time if `Some`
    Reschedule { at: Option<DateTime<Utc>> },
}

/// Reminder plan for a task update.
///
/// `new_eta` is `None` when the request left the field out, `Some(None)`
/// when it cleared the ETA and `Some(Some(_))` when it set one. Setting the
/// same ETA again is not a change.
pub fn plan_for_update(
    prior_eta: Option<DateTime<Utc>>,
    new_eta: Option<Option<DateTime<Utc>>>,
    now: DateTime<Utc>,
) -> ReminderPlan {
    match new_eta {
        None => ReminderPlan::Unchanged,
        Some(eta) if eta == prior_eta => ReminderPlan::Unchanged,
        Some(eta) => ReminderPlan::Reschedule {
            at: plan_for_create(eta, now),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_fires_one_hour_before_eta() {
        let eta = Utc::now() + Duration::hours(5);
        assert_eq!(reminder_at(eta), eta - Duration::hours(1));
    }

    #[test]
    fn test_create_schedules_only_strictly_future_reminders() {
        let now = Utc::now();

        let far = now + Duration::hours(2);
        assert_eq!(plan_for_create(Some(far), now), Some(far - Duration::hours(1)));

        // ETA 30 minutes out puts the fire time in the past
        let near = now + Duration::minutes(30);
        assert_eq!(plan_for_create(Some(near), now), None);

        // Fire time landing exactly on now is not strictly future
        let boundary = now + Duration::hours(1);
        assert_eq!(plan_for_create(Some(boundary), now), None);

        assert_eq!(plan_for_create(None, now), None);
    }

    #[test]
    fn test_update_without_eta_field_leaves_reminder_alone() {
        let now = Utc::now();
        let prior = Some(now + Duration::hours(3));

        assert_eq!(plan_for_update(prior, None, now), ReminderPlan::Unchanged);
    }

    #[test]
    fn test_update_with_same_eta_is_not_a_change() {
        let now = Utc::now();
        let eta = now + Duration::hours(3);

        assert_eq!(
            plan_for_update(Some(eta), Some(Some(eta)), now),
            ReminderPlan::Unchanged
        );
    }

    #[test]
    fn test_update_with_new_eta_reschedules() {
        let now = Utc::now();
        let prior = Some(now + Duration::hours(3));
        let next = now + Duration::hours(6);

        assert_eq!(
            plan_for_update(prior, Some(Some(next)), now),
            ReminderPlan::Reschedule {
                at: Some(next - Duration::hours(1))
            }
        );
    }

    #[test]
    fn test_update_to_near_eta_cancels_without_scheduling() {
        let now = Utc::now();
        let prior = Some(now + Duration::hours(3));
        let near = now + Duration::minutes(30);

        assert_eq!(
            plan_for_update(prior, Some(Some(near)), now),
            ReminderPlan::Reschedule { at: None }
        );
    }

    #[test]
    fn test_clearing_eta_cancels_reminder() {
        let now = Utc::now();
        let prior = Some(now + Duration::hours(3));

        assert_eq!(
            plan_for_update(prior, Some(None), now),
            ReminderPlan::Reschedule { at: None }
        );
    }
}
