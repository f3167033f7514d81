//! Agent model configuration.
//!
//! The shared agent configuration document (`agent.json`) is owned by the
//! wider system; wr reads the configured model identifiers and writes the
//! single `agents.defaults.model.primary` field. The document is handled as
//! raw JSON so unrelated content survives every rewrite.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::docs::DocStore;
use crate::error::Result;

/// Model prefix stripped from identifiers for display
const PROVIDER_PREFIX: &str = "anthropic/";

#[derive(Debug, Clone)]
pub struct AgentConfigStore {
    path: PathBuf,
    docs: Arc<DocStore>,
}

impl AgentConfigStore {
    pub fn new(path: impl Into<PathBuf>, docs: Arc<DocStore>) -> Self {
        Self {
            path: path.into(),
            docs,
        }
    }

    async fn read_config(&self) -> Value {
        self.docs.read(&self.path, || json!({})).await
    }

    /// Configured model identifiers: primary, fallbacks, then the keys of
    /// the per-model table, de-duplicated in first-seen order
    pub async fn models(&self) -> Vec<String> {
        let config = self.read_config().await;
        let model = config
            .pointer("/agents/defaults/model")
            .cloned()
            .unwrap_or(Value::Null);

        let mut seen: Vec<String> = Vec::new();
        let mut push = |candidate: &str| {
            if !candidate.is_empty() && !seen.iter().any(|known| known == candidate) {
                seen.push(candidate.to_string());
            }
        };

        if let Some(primary) = model.get("primary").and_then(Value::as_str) {
            push(primary);
        }
        if let Some(fallbacks) = model.get("fallbacks").and_then(Value::as_array) {
            for fallback in fallbacks.iter().filter_map(Value::as_str) {
                push(fallback);
            }
        }
        if let Some(table) = config
            .pointer("/agents/defaults/models")
            .and_then(Value::as_object)
        {
            for key in table.keys() {
                push(key);
            }
        }
        seen
    }

    /// Persist the active model into the shared config document
    pub async fn set_model(&self, model: &str) -> Result<()> {
        let model = model.to_string();
        self.docs
            .update(&self.path, || json!({}), move |config: &mut Value| {
                if !config.is_object() {
                    *config = json!({});
                }
                let slot = ensure_object(
                    ensure_object(ensure_object(config, "agents"), "defaults"),
                    "model",
                );
                slot["primary"] = json!(model);
                Ok(())
            })
            .await
    }

    /// Active model identifier with the provider prefix stripped;
    /// `unknown` when unconfigured
    pub async fn active_model(&self) -> String {
        let config = self.read_config().await;
        let raw = config
            .pointer("/agents/defaults/model/primary")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        raw.strip_prefix(PROVIDER_PREFIX).unwrap_or(raw).to_string()
    }
}

pub(crate) fn ensure_object<'a>(value: &'a mut Value, key: &str) -> &'a mut Value {
    if !value.get(key).is_some_and(Value::is_object) {
        value[key] = json!({});
    }
    &mut value[key]
}
