//! Usage ledger.
//!
//! Approximates token-quota consumption over two rolling windows (5-hour
//! session, 7-day week) by scanning the append-only per-session `.jsonl`
//! logs. Only entries with a non-zero cost annotation count; their
//! contribution is input + output + cache-read tokens. The computed
//! snapshot is cached in an injected [`UsageCache`] so repeated reads do
//! not rescan the filesystem.
//!
//! The ledger holds no document lock: a read that races a recomputation is
//! at most TTL-seconds stale, never wrong by more than that.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use glob::glob;
use serde::Serialize;
use serde_json::Value;
use tokio::task;

use crate::config::Config;
use crate::error::Result;
use crate::models::AgentConfigStore;
use crate::queue::parse_timestamp;

/// Rolling session window
pub const SESSION_WINDOW_HOURS: i64 = 5;

/// Rolling weekly window
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// One quota tier of the usage snapshot
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageTier {
    pub label: String,
    /// Consumed share of the ceiling, clamped to 100
    pub percent: u32,
    pub resets_in: String,
}

/// Derived, non-persisted usage aggregate
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub model: String,
    pub tiers: Vec<UsageTier>,
}

/// Explicit snapshot cache: value, computed-at, TTL.
///
/// Injected rather than global so tests control time by choosing the TTL.
#[derive(Debug)]
pub struct UsageCache {
    ttl: Duration,
    slot: StdMutex<Option<(Instant, UsageSnapshot)>>,
}

impl UsageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: StdMutex::new(None),
        }
    }

    fn get(&self) -> Option<UsageSnapshot> {
        let slot = self.slot.lock().expect("usage cache poisoned");
        slot.as_ref()
            .filter(|(computed_at, _)| computed_at.elapsed() < self.ttl)
            .map(|(_, snapshot)| snapshot.clone())
    }

    fn put(&self, snapshot: UsageSnapshot) {
        let mut slot = self.slot.lock().expect("usage cache poisoned");
        *slot = Some((Instant::now(), snapshot));
    }
}

/// Windowed token accounting over the session log directory
#[derive(Debug)]
pub struct UsageLedger {
    sessions_dir: PathBuf,
    session_limit: u64,
    weekly_limit: u64,
    model_config: AgentConfigStore,
    cache: UsageCache,
}

impl UsageLedger {
    pub fn new(config: &Config, model_config: AgentConfigStore, cache: UsageCache) -> Self {
        Self {
            sessions_dir: config.paths.sessions_dir.clone(),
            session_limit: config.usage.session_limit,
            weekly_limit: config.usage.weekly_limit,
            model_config,
            cache,
        }
    }

    /// Current usage snapshot, served from cache within its TTL
    pub async fn snapshot(&self) -> Result<UsageSnapshot> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }

        let model = self.model_config.active_model().await;
        let sessions_dir = self.sessions_dir.clone();
        let (session_tokens, week_tokens) =
            task::spawn_blocking(move || scan_sessions(&sessions_dir, Utc::now())).await?;
        tracing::debug!(session_tokens, week_tokens, "usage recomputed");

        let session_reset_ms = (SESSION_WINDOW_HOURS * 3600 * 1000) as u64;
        let weekly_reset_ms = (WEEK_WINDOW_DAYS * 24 * 3600 * 1000) as u64;
        let snapshot = UsageSnapshot {
            model,
            tiers: vec![
                UsageTier {
                    label: "Current session".to_string(),
                    percent: percent_of(session_tokens, self.session_limit),
                    resets_in: format_reset(session_reset_ms),
                },
                UsageTier {
                    label: "Current week (all models)".to_string(),
                    percent: percent_of(week_tokens, self.weekly_limit),
                    resets_in: format_reset(weekly_reset_ms),
                },
            ],
        };
        self.cache.put(snapshot.clone());
        Ok(snapshot)
    }
}

/// Sum window contributions across all session logs.
///
/// Per-file failures are isolated: an unreadable or corrupt file simply
/// contributes zero. Files whose mtime predates the weekly window are
/// skipped without being read.
fn scan_sessions(dir: &Path, now: DateTime<Utc>) -> (u64, u64) {
    let session_start = now - ChronoDuration::hours(SESSION_WINDOW_HOURS);
    let week_start = now - ChronoDuration::days(WEEK_WINDOW_DAYS);

    let mut session_tokens = 0u64;
    let mut week_tokens = 0u64;

    let pattern = dir.join("*.jsonl");
    let Ok(paths) = glob(&pattern.to_string_lossy()) else {
        return (0, 0);
    };

    for path in paths.flatten() {
        let Ok(modified) = fs::metadata(&path).and_then(|meta| meta.modified()) else {
            continue;
        };
        let mtime = DateTime::<Utc>::from(modified);
        if mtime < week_start {
            continue;
        }
        let Ok(bytes) = fs::read(&path) else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(record) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            let usage = record
                .pointer("/message/usage")
                .filter(|usage| usage.is_object())
                .or_else(|| record.get("usage"));
            let Some(usage) = usage else {
                continue;
            };
            if !has_cost(usage) {
                continue;
            }
            let tokens =
                token_field(usage, "input") + token_field(usage, "output") + token_field(usage, "cacheRead");

            let timestamp = record
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
                .unwrap_or(mtime);

            if timestamp >= week_start {
                week_tokens += tokens;
            }
            if timestamp >= session_start {
                session_tokens += tokens;
            }
        }
    }

    (session_tokens, week_tokens)
}

fn has_cost(usage: &Value) -> bool {
    usage
        .pointer("/cost/total")
        .and_then(Value::as_f64)
        .is_some_and(|total| total != 0.0)
}

fn token_field(usage: &Value, key: &str) -> u64 {
    match usage.get(key) {
        Some(value) => value
            .as_u64()
            .or_else(|| value.as_f64().map(|float| float as u64))
            .unwrap_or(0),
        None => 0,
    }
}

fn percent_of(tokens: u64, ceiling: u64) -> u32 {
    if ceiling == 0 {
        return 100;
    }
    let raw = (tokens as f64 / ceiling as f64) * 100.0;
    (raw.round() as u32).min(100)
}

/// Render milliseconds as "2h 15m" or "7d 0h"
fn format_reset(ms: u64) -> String {
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let days = hours / 24;
    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else {
        format!("{hours}h {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_log(dir: &Path, name: &str, lines: &[Value]) {
        let body: String = lines
            .iter()
            .map(|line| format!("{line}\n"))
            .collect();
        fs::write(dir.join(name), body).expect("write session log");
    }

    fn entry(timestamp: &str, tokens: u64, cost: f64) -> Value {
        json!({
            "timestamp": timestamp,
            "usage": {
                "input": tokens / 2,
                "output": tokens / 2,
                "cacheRead": 0,
                "cost": {"total": cost},
            }
        })
    }

    #[test]
    fn format_reset_renders_hours_and_days() {
        assert_eq!(format_reset(5 * 3600 * 1000), "5h 0m");
        assert_eq!(format_reset(7 * 24 * 3600 * 1000), "7d 0h");
        assert_eq!(format_reset(2 * 3600 * 1000 + 15 * 60 * 1000), "2h 15m");
    }

    #[test]
    fn percent_clamps_at_100() {
        assert_eq!(percent_of(0, 1000), 0);
        assert_eq!(percent_of(500, 1000), 50);
        assert_eq!(percent_of(5000, 1000), 100);
    }

    #[test]
    fn zero_cost_entries_are_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let now = Utc::now();
        write_log(
            dir.path(),
            "a.jsonl",
            &[
                entry(&now.to_rfc3339(), 1000, 0.5),
                entry(&now.to_rfc3339(), 9999, 0.0),
            ],
        );
        let (session, week) = scan_sessions(dir.path(), now);
        assert_eq!(session, 1000);
        assert_eq!(week, 1000);
    }

    #[test]
    fn entries_attribute_to_windows_by_their_own_timestamp() {
        let dir = TempDir::new().expect("tempdir");
        let now = Utc::now();
        let in_session = now - ChronoDuration::hours(1);
        let in_week = now - ChronoDuration::days(2);
        let ancient = now - ChronoDuration::days(30);
        write_log(
            dir.path(),
            "a.jsonl",
            &[
                entry(&in_session.to_rfc3339(), 100, 1.0),
                entry(&in_week.to_rfc3339(), 200, 1.0),
                entry(&ancient.to_rfc3339(), 400, 1.0),
            ],
        );
        let (session, week) = scan_sessions(dir.path(), now);
        assert_eq!(session, 100);
        assert_eq!(week, 300, "ancient entries fall outside both windows");
    }

    #[test]
    fn nested_message_usage_is_read() {
        let dir = TempDir::new().expect("tempdir");
        let now = Utc::now();
        let line = json!({
            "timestamp": now.to_rfc3339(),
            "message": {"usage": {"input": 10, "output": 20, "cacheRead": 30, "cost": {"total": 0.1}}}
        });
        write_log(dir.path(), "nested.jsonl", &[line]);
        let (session, _) = scan_sessions(dir.path(), now);
        assert_eq!(session, 60);
    }

    #[test]
    fn corrupt_lines_and_missing_dir_contribute_zero() {
        let dir = TempDir::new().expect("tempdir");
        let now = Utc::now();
        fs::write(dir.path().join("bad.jsonl"), "{oops\n\n").expect("write");
        assert_eq!(scan_sessions(dir.path(), now), (0, 0));
        assert_eq!(scan_sessions(&dir.path().join("absent"), now), (0, 0));
    }
}
