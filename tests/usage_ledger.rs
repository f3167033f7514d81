mod support;

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use support::TestEnv;

fn usage_line(timestamp: &str, input: u64, output: u64, cache_read: u64, cost: f64) -> String {
    json!({
        "timestamp": timestamp,
        "usage": {
            "input": input,
            "output": output,
            "cacheRead": cache_read,
            "cost": {"total": cost},
        }
    })
    .to_string()
}

#[tokio::test]
async fn empty_sessions_directory_reports_zero_usage() {
    let env = TestEnv::new();
    let ledger = env.usage_ledger(Duration::from_secs(60));

    let snapshot = ledger.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.model, "unknown");
    assert_eq!(snapshot.tiers.len(), 2);
    assert_eq!(snapshot.tiers[0].label, "Current session");
    assert_eq!(snapshot.tiers[0].percent, 0);
    assert_eq!(snapshot.tiers[0].resets_in, "5h 0m");
    assert_eq!(snapshot.tiers[1].label, "Current week (all models)");
    assert_eq!(snapshot.tiers[1].percent, 0);
    assert_eq!(snapshot.tiers[1].resets_in, "7d 0h");
}

#[tokio::test]
async fn missing_sessions_directory_is_not_an_error() {
    let mut env = TestEnv::new();
    env.config.paths.sessions_dir = env.path().join("nowhere");
    let ledger = env.usage_ledger(Duration::from_secs(60));

    let snapshot = ledger.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.tiers[0].percent, 0);
    assert_eq!(snapshot.tiers[1].percent, 0);
}

#[tokio::test]
async fn usage_over_the_ceiling_clamps_to_100() {
    let mut env = TestEnv::new();
    env.config.usage.session_limit = 1_000;
    env.config.usage.weekly_limit = 1_000;
    let now = Utc::now().to_rfc3339();
    env.write_session_log(
        "big.jsonl",
        &format!("{}\n", usage_line(&now, 900_000, 900_000, 0, 12.5)),
    );

    let ledger = env.usage_ledger(Duration::from_secs(60));
    let snapshot = ledger.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.tiers[0].percent, 100, "never above 100");
    assert_eq!(snapshot.tiers[1].percent, 100);
}

#[tokio::test]
async fn percentages_reflect_counted_tokens() {
    let mut env = TestEnv::new();
    env.config.usage.session_limit = 10_000;
    env.config.usage.weekly_limit = 100_000;
    let now = Utc::now().to_rfc3339();
    let lines = [
        usage_line(&now, 1_000, 2_000, 2_000, 0.5),
        // zero-cost entries never count
        usage_line(&now, 50_000, 50_000, 0, 0.0),
    ]
    .join("\n");
    env.write_session_log("session.jsonl", &lines);

    let ledger = env.usage_ledger(Duration::from_secs(60));
    let snapshot = ledger.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.tiers[0].percent, 50, "5k of 10k session tokens");
    assert_eq!(snapshot.tiers[1].percent, 5, "5k of 100k weekly tokens");
}

#[tokio::test]
async fn snapshot_is_cached_within_ttl() {
    let mut env = TestEnv::new();
    env.config.usage.session_limit = 1_000;
    let now = Utc::now().to_rfc3339();
    env.write_session_log("a.jsonl", &format!("{}\n", usage_line(&now, 100, 100, 0, 0.1)));

    let ledger = env.usage_ledger(Duration::from_secs(60));
    let first = ledger.snapshot().await.expect("first");

    // new usage lands but the cache still answers
    env.write_session_log("b.jsonl", &format!("{}\n", usage_line(&now, 400, 400, 0, 0.1)));
    let second = ledger.snapshot().await.expect("second");
    assert_eq!(first, second, "cached result within TTL");

    // a zero-TTL cache recomputes every call
    let fresh = env.usage_ledger(Duration::ZERO);
    let third = fresh.snapshot().await.expect("third");
    assert!(third.tiers[0].percent > first.tiers[0].percent);
}

#[tokio::test]
async fn model_comes_from_agent_config() {
    let env = TestEnv::new();
    env.models()
        .set_model("anthropic/claude-opus-4")
        .await
        .expect("set model");

    let ledger = env.usage_ledger(Duration::from_secs(60));
    let snapshot = ledger.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.model, "claude-opus-4");
}
