mod support;

use std::fs;

use support::TestEnv;
use wr::stats::{calendar, war_room_stats};
use wr::task::{NewTask, TaskStatus};

#[tokio::test]
async fn heartbeat_round_trips() {
    let env = TestEnv::new();
    let heartbeat = env.heartbeat();

    assert!(heartbeat.get().await.last_heartbeat.is_none());

    let recorded = heartbeat.record().await.expect("record");
    let read_back = heartbeat.get().await;
    assert_eq!(recorded, read_back);
    assert!(read_back.last_heartbeat.is_some());
}

#[tokio::test]
async fn stats_count_statuses_and_carry_heartbeat_and_model() {
    let env = TestEnv::new();
    let tasks = env.tasks();

    for status in [TaskStatus::Todo, TaskStatus::Todo, TaskStatus::Backlog] {
        tasks
            .create(NewTask {
                title: "t".to_string(),
                status,
                ..NewTask::default()
            })
            .await
            .expect("create");
    }
    let running = tasks
        .create(NewTask {
            title: "running".to_string(),
            status: TaskStatus::Todo,
            ..NewTask::default()
        })
        .await
        .expect("create");
    tasks.run(&running.id).await.expect("run");

    env.heartbeat().record().await.expect("beat");
    env.models()
        .set_model("anthropic/claude-opus-4")
        .await
        .expect("set model");

    let stats = war_room_stats(&tasks, &env.heartbeat(), &env.models())
        .await
        .expect("stats");
    assert_eq!(stats.in_progress_count, 1);
    assert_eq!(stats.todo_count, 2);
    assert!(stats.last_heartbeat.is_some());
    assert_eq!(stats.active_model, "claude-opus-4");
}

#[tokio::test]
async fn calendar_merges_memory_notes_and_completed_tasks() {
    let env = TestEnv::new();
    let tasks = env.tasks();

    fs::write(env.config.paths.memory_dir.join("2026-08-01.md"), "notes").expect("note");
    fs::write(env.config.paths.memory_dir.join("not-a-date.md"), "junk").expect("note");

    let task = tasks
        .create(NewTask {
            title: "Ship report".to_string(),
            status: TaskStatus::Todo,
            ..NewTask::default()
        })
        .await
        .expect("create");
    tasks.complete(&task.id, None, None).await.expect("complete");

    let days = calendar(&tasks, &env.config.paths.memory_dir)
        .await
        .expect("calendar");

    let note_day = days.get("2026-08-01").expect("memory day");
    assert!(note_day.memory);
    assert!(note_day.tasks.is_empty());

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let completed_day = days.get(&today).expect("completion day");
    assert_eq!(completed_day.tasks, vec!["Ship report".to_string()]);
    assert!(!days.contains_key("not-a-date"));
}
