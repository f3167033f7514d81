//! Queue extraction for autonomous workers.
//!
//! Pure derivation over the task collection: no state, no consumption.
//! Repeated calls over unchanged data return the same ordered list.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::task::{Task, TaskStatus};

/// Parse an ISO-8601 timestamp; values without an explicit offset are read
/// as UTC. Returns `None` when the string is not a timestamp at all.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Does the schedule descriptor permit pickup right now?
///
/// Absent/blank schedules and the `asap`/`next-heartbeat` sentinels are
/// always eligible. A timestamp is eligible once it has passed. A string
/// that fails to parse is eligible (fail-open).
fn schedule_permits(schedule: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(schedule) = schedule.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };
    if schedule == "asap" || schedule == "next-heartbeat" {
        return true;
    }
    match parse_timestamp(schedule) {
        Some(due) => due <= now,
        None => true,
    }
}

/// Compute the ordered set of tasks a worker should claim next.
///
/// Candidates are in-progress tasks not yet picked up (started via run-now)
/// plus todo tasks whose schedule permits. Sorted by priority rank, then by
/// `scheduledAt` ascending with missing values first; the sort is stable
/// beyond that.
pub fn eligible_queue(tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
    let mut queue: Vec<Task> = tasks
        .into_iter()
        .filter(|task| match task.status {
            TaskStatus::InProgress => !task.picked_up,
            TaskStatus::Todo => schedule_permits(task.schedule.as_deref(), now),
            _ => false,
        })
        .collect();

    queue.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| {
                a.scheduled_at
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.scheduled_at.as_deref().unwrap_or(""))
            })
    });
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPriority;
    use chrono::Duration;

    fn task(id: &str, status: TaskStatus, priority: TaskPriority) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            status,
            priority,
            project: None,
            tags: Vec::new(),
            skill: None,
            schedule: None,
            scheduled_at: None,
            references: Vec::new(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            picked_up: false,
            created_at: String::new(),
            updated_at: String::new(),
            estimated_hours: None,
            actual_hours: None,
        }
    }

    #[test]
    fn parses_offset_naive_and_date_forms() {
        assert!(parse_timestamp("2026-03-01T10:00:00+02:00").is_some());
        let naive = parse_timestamp("2026-03-01T10:00:00").expect("naive");
        assert_eq!(naive.to_rfc3339(), "2026-03-01T10:00:00+00:00");
        assert!(parse_timestamp("2026-03-01").is_some());
        assert!(parse_timestamp("not a time").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn orders_by_priority_rank() {
        let now = Utc::now();
        let tasks = vec![
            task("low", TaskStatus::Todo, TaskPriority::Low),
            task("urgent", TaskStatus::Todo, TaskPriority::Urgent),
            task("high", TaskStatus::Todo, TaskPriority::High),
            task("medium", TaskStatus::Todo, TaskPriority::Medium),
        ];
        let ids: Vec<String> = eligible_queue(tasks, now)
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec!["urgent", "high", "medium", "low"]);
    }

    #[test]
    fn scheduled_at_breaks_priority_ties_missing_first() {
        let now = Utc::now();
        let mut later = task("later", TaskStatus::Todo, TaskPriority::High);
        later.scheduled_at = Some("2026-06-01T09:00:00+00:00".to_string());
        let mut sooner = task("sooner", TaskStatus::Todo, TaskPriority::High);
        sooner.scheduled_at = Some("2026-05-01T09:00:00+00:00".to_string());
        let unscheduled = task("unscheduled", TaskStatus::Todo, TaskPriority::High);

        let ids: Vec<String> = eligible_queue(vec![later, sooner, unscheduled], now)
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec!["unscheduled", "sooner", "later"]);
    }

    #[test]
    fn future_schedule_excludes_until_due() {
        let now = Utc::now();
        let mut scheduled = task("later", TaskStatus::Todo, TaskPriority::Urgent);
        scheduled.schedule = Some((now + Duration::hours(1)).to_rfc3339());

        assert!(eligible_queue(vec![scheduled.clone()], now).is_empty());
        let past = now + Duration::hours(2);
        assert_eq!(eligible_queue(vec![scheduled], past).len(), 1);
    }

    #[test]
    fn sentinels_and_garbage_schedules_are_eligible() {
        let now = Utc::now();
        let mut asap = task("asap", TaskStatus::Todo, TaskPriority::Medium);
        asap.schedule = Some("asap".to_string());
        let mut heartbeat = task("hb", TaskStatus::Todo, TaskPriority::Medium);
        heartbeat.schedule = Some("next-heartbeat".to_string());
        let mut garbage = task("garbage", TaskStatus::Todo, TaskPriority::Medium);
        garbage.schedule = Some("whenever you feel like it".to_string());

        assert_eq!(eligible_queue(vec![asap, heartbeat, garbage], now).len(), 3);
    }

    #[test]
    fn only_unclaimed_in_progress_tasks_are_offered() {
        let now = Utc::now();
        let unclaimed = task("unclaimed", TaskStatus::InProgress, TaskPriority::Medium);
        let mut claimed = task("claimed", TaskStatus::InProgress, TaskPriority::Medium);
        claimed.picked_up = true;
        let backlog = task("backlog", TaskStatus::Backlog, TaskPriority::Urgent);
        let done = task("done", TaskStatus::Done, TaskPriority::Urgent);

        let ids: Vec<String> = eligible_queue(vec![unclaimed, claimed, backlog, done], now)
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec!["unclaimed"]);
    }

    #[test]
    fn repeated_extraction_is_stable() {
        let now = Utc::now();
        let tasks = vec![
            task("a", TaskStatus::Todo, TaskPriority::Medium),
            task("b", TaskStatus::Todo, TaskPriority::Medium),
            task("c", TaskStatus::Todo, TaskPriority::Medium),
        ];
        let first: Vec<String> = eligible_queue(tasks.clone(), now)
            .into_iter()
            .map(|task| task.id)
            .collect();
        let second: Vec<String> = eligible_queue(tasks, now)
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["a", "b", "c"], "stable sort keeps input order on ties");
    }
}
