mod support;

use chrono::{Duration, Utc};
use support::TestEnv;
use wr::task::{NewTask, TaskPatch, TaskPriority, TaskStatus};

fn todo(title: &str, priority: TaskPriority) -> NewTask {
    NewTask {
        title: title.to_string(),
        priority,
        status: TaskStatus::Todo,
        ..NewTask::default()
    }
}

#[tokio::test]
async fn queue_orders_by_priority() {
    let env = TestEnv::new();
    let store = env.tasks();
    for (title, priority) in [
        ("low", TaskPriority::Low),
        ("urgent", TaskPriority::Urgent),
        ("high", TaskPriority::High),
        ("medium", TaskPriority::Medium),
    ] {
        store.create(todo(title, priority)).await.expect("create");
    }

    let titles: Vec<String> = store
        .queue()
        .await
        .into_iter()
        .map(|task| task.title)
        .collect();
    assert_eq!(titles, vec!["urgent", "high", "medium", "low"]);
}

#[tokio::test]
async fn future_schedule_gates_eligibility() {
    let env = TestEnv::new();
    let store = env.tasks();
    let task = store
        .create(NewTask {
            title: "Scheduled".to_string(),
            status: TaskStatus::Todo,
            schedule: Some((Utc::now() + Duration::hours(1)).to_rfc3339()),
            ..NewTask::default()
        })
        .await
        .expect("create");

    assert!(store.queue().await.is_empty(), "not yet due");

    // once the scheduled instant is in the past the task appears
    store
        .update(
            &task.id,
            TaskPatch {
                schedule: Some(Some((Utc::now() - Duration::seconds(1)).to_rfc3339())),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("reschedule");
    let queue = store.queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, task.id);
}

#[tokio::test]
async fn sentinel_schedules_are_immediately_eligible() {
    let env = TestEnv::new();
    let store = env.tasks();
    for schedule in ["asap", "next-heartbeat"] {
        store
            .create(NewTask {
                title: schedule.to_string(),
                status: TaskStatus::Todo,
                schedule: Some(schedule.to_string()),
                ..NewTask::default()
            })
            .await
            .expect("create");
    }
    assert_eq!(store.queue().await.len(), 2);
}

#[tokio::test]
async fn backlog_and_done_never_queue() {
    let env = TestEnv::new();
    let store = env.tasks();
    store
        .create(NewTask {
            title: "Backlog".to_string(),
            status: TaskStatus::Backlog,
            priority: TaskPriority::Urgent,
            ..NewTask::default()
        })
        .await
        .expect("create");
    let done = store
        .create(todo("Done soon", TaskPriority::Urgent))
        .await
        .expect("create");
    store
        .complete(&done.id, None, None)
        .await
        .expect("complete");

    assert!(store.queue().await.is_empty());
}

#[tokio::test]
async fn repeated_queue_reads_have_no_side_effects() {
    let env = TestEnv::new();
    let store = env.tasks();
    store
        .create(todo("Stable", TaskPriority::Medium))
        .await
        .expect("create");

    let first: Vec<String> = store.queue().await.into_iter().map(|task| task.id).collect();
    let second: Vec<String> = store.queue().await.into_iter().map(|task| task.id).collect();
    assert_eq!(first, second);
}
