#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wr::config::{Config, PathsConfig, UsageConfig};
use wr::docs::DocStore;
use wr::heartbeat::HeartbeatStore;
use wr::models::AgentConfigStore;
use wr::project::ProjectStore;
use wr::skills::SkillCatalog;
use wr::task::TaskStore;
use wr::usage::{UsageCache, UsageLedger};
use wr::workspace::WorkspaceFiles;

/// A self-contained wr environment rooted in a tempdir
pub struct TestEnv {
    dir: TempDir,
    pub config: Config,
    docs: Arc<DocStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        let config = Config {
            paths: PathsConfig {
                data_dir: root.join("data"),
                workspace_dir: root.join("workspace"),
                agent_dir: root.join("agent"),
                sessions_dir: root.join("sessions"),
                memory_dir: root.join("memory"),
                bundled_skills_dir: None,
            },
            usage: UsageConfig::default(),
        };
        for path in [
            &config.paths.data_dir,
            &config.paths.workspace_dir,
            &config.paths.agent_dir,
            &config.paths.sessions_dir,
            &config.paths.memory_dir,
        ] {
            fs::create_dir_all(path).expect("env dirs");
        }
        let docs = Arc::new(DocStore::new(config.paths.data_dir.clone()));
        Self { dir, config, docs }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.docs.clone())
    }

    pub fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.docs.clone())
    }

    pub fn workspace(&self) -> WorkspaceFiles {
        WorkspaceFiles::new(self.config.paths.workspace_dir.clone(), self.docs.clone())
    }

    pub fn heartbeat(&self) -> HeartbeatStore {
        HeartbeatStore::new(self.docs.clone())
    }

    pub fn models(&self) -> AgentConfigStore {
        AgentConfigStore::new(self.config.paths.agent_config_file(), self.docs.clone())
    }

    pub fn skills(&self) -> SkillCatalog {
        SkillCatalog::new(&self.config, self.docs.clone())
    }

    pub fn usage_ledger(&self, ttl: Duration) -> UsageLedger {
        UsageLedger::new(&self.config, self.models(), UsageCache::new(ttl))
    }

    /// Seed the raw tasks document, bypassing the store
    pub fn seed_tasks_doc(&self, raw: &serde_json::Value) {
        let path = self.config.paths.data_dir.join("tasks.json");
        fs::write(&path, serde_json::to_string_pretty(raw).expect("serialize")).expect("seed");
    }

    pub fn tasks_doc_bytes(&self) -> Vec<u8> {
        fs::read(self.config.paths.data_dir.join("tasks.json")).expect("tasks doc")
    }

    /// Write an append-only session log under the sessions directory
    pub fn write_session_log(&self, name: &str, body: &str) {
        fs::write(self.config.paths.sessions_dir.join(name), body).expect("session log");
    }

    /// Write a wr.toml pointing at this environment, for CLI invocations
    pub fn write_config_file(&self) -> PathBuf {
        let path = self.dir.path().join("wr.toml");
        let toml = format!(
            r#"[paths]
data_dir = {:?}
workspace_dir = {:?}
agent_dir = {:?}
sessions_dir = {:?}
memory_dir = {:?}
"#,
            self.config.paths.data_dir,
            self.config.paths.workspace_dir,
            self.config.paths.agent_dir,
            self.config.paths.sessions_dir,
            self.config.paths.memory_dir,
        );
        fs::write(&path, toml).expect("config file");
        path
    }
}
