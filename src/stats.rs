//! Overview widgets: headline stats and the activity calendar.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tokio::task;

use crate::error::Result;
use crate::heartbeat::HeartbeatStore;
use crate::models::AgentConfigStore;
use crate::task::{TaskFilter, TaskStatus, TaskStore};

/// Headline numbers for the dashboard overview widget
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarRoomStats {
    pub in_progress_count: usize,
    pub todo_count: usize,
    pub last_heartbeat: Option<i64>,
    pub active_model: String,
}

/// One day of calendar activity
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CalendarDay {
    pub memory: bool,
    pub tasks: Vec<String>,
}

pub async fn war_room_stats(
    tasks: &TaskStore,
    heartbeat: &HeartbeatStore,
    models: &AgentConfigStore,
) -> Result<WarRoomStats> {
    let all = tasks.list(&TaskFilter::default()).await;
    let beat = heartbeat.get().await;
    Ok(WarRoomStats {
        in_progress_count: all
            .iter()
            .filter(|task| task.status == TaskStatus::InProgress)
            .count(),
        todo_count: all
            .iter()
            .filter(|task| task.status == TaskStatus::Todo)
            .count(),
        last_heartbeat: beat.last_heartbeat,
        active_model: models.active_model().await,
    })
}

fn daily_note_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\.md$").expect("daily note regex"))
}

/// Map of `YYYY-MM-DD` to that day's activity: whether a daily memory note
/// exists and which tasks completed. A missing memory directory is fine.
pub async fn calendar(
    tasks: &TaskStore,
    memory_dir: &Path,
) -> Result<BTreeMap<String, CalendarDay>> {
    let memory_dir = memory_dir.to_path_buf();
    let memory_days: Vec<String> = task::spawn_blocking(move || {
        let Ok(entries) = fs::read_dir(&memory_dir) else {
            return Vec::new();
        };
        entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| daily_note_name().is_match(name))
            .map(|name| name.trim_end_matches(".md").to_string())
            .collect()
    })
    .await?;

    let mut days: BTreeMap<String, CalendarDay> = BTreeMap::new();
    for day in memory_days {
        days.entry(day).or_default().memory = true;
    }
    for task in tasks.list(&TaskFilter::default()).await {
        if let Some(day) = task
            .completed_at
            .as_deref()
            .and_then(|completed_at| completed_at.get(..10))
        {
            days.entry(day.to_string()).or_default().tasks.push(task.title);
        }
    }
    Ok(days)
}
