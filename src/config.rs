//! Configuration loading and management
//!
//! Handles parsing of `wr.toml` configuration files. All paths default to
//! locations under the user's home directory so a bare `wr` invocation works
//! against the same state the deployed dashboard serves.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "WR_CONFIG";

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE: &str = "wr.toml";

/// File name of the shared agent configuration document
pub const AGENT_CONFIG_FILE: &str = "agent.json";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Usage-ledger ceilings and cache tuning
    #[serde(default)]
    pub usage: UsageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            usage: UsageConfig::default(),
        }
    }
}

/// Filesystem layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the dashboard documents (tasks.json, projects.json,
    /// heartbeat.json, per-file history)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Agent workspace directory (SOUL.md and friends, workspace skills)
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// Agent home directory (shared agent.json, managed skills)
    #[serde(default = "default_agent_dir")]
    pub agent_dir: PathBuf,

    /// Directory of append-only per-session `.jsonl` logs
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,

    /// Directory of daily memory notes (`YYYY-MM-DD.md`)
    #[serde(default = "default_memory_dir")]
    pub memory_dir: PathBuf,

    /// Optional directory of bundled (read-only) skills
    #[serde(default)]
    pub bundled_skills_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            workspace_dir: default_workspace_dir(),
            agent_dir: default_agent_dir(),
            sessions_dir: default_sessions_dir(),
            memory_dir: default_memory_dir(),
            bundled_skills_dir: None,
        }
    }
}

impl PathsConfig {
    /// Path to the shared agent configuration document
    pub fn agent_config_file(&self) -> PathBuf {
        self.agent_dir.join(AGENT_CONFIG_FILE)
    }

    /// Directory of managed skills under the agent home
    pub fn managed_skills_dir(&self) -> PathBuf {
        self.agent_dir.join("skills")
    }

    /// Directory of workspace skills
    pub fn workspace_skills_dir(&self) -> PathBuf {
        self.workspace_dir.join("skills")
    }
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_agent_dir() -> PathBuf {
    home_dir().join(".wr")
}

fn default_data_dir() -> PathBuf {
    default_agent_dir().join("dashboard")
}

fn default_workspace_dir() -> PathBuf {
    default_agent_dir().join("workspace")
}

fn default_sessions_dir() -> PathBuf {
    default_agent_dir().join("sessions")
}

fn default_memory_dir() -> PathBuf {
    default_workspace_dir().join("memory")
}

/// Usage-ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Token ceiling for the rolling 5-hour session window
    #[serde(default = "default_session_limit")]
    pub session_limit: u64,

    /// Token ceiling for the rolling 7-day window
    #[serde(default = "default_weekly_limit")]
    pub weekly_limit: u64,

    /// Seconds a computed usage snapshot stays cached
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_session_limit() -> u64 {
    45_000_000
}

fn default_weekly_limit() -> u64 {
    180_000_000
}

fn default_cache_ttl_secs() -> u64 {
    60
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            session_limit: default_session_limit(),
            weekly_limit: default_weekly_limit(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Config {
    /// Load configuration, resolving the file in order of precedence:
    /// explicit path, `WR_CONFIG`, `./wr.toml`, built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Self::from_file(Path::new(trimmed));
            }
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    /// Parse a config file, failing loudly on missing file or bad TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            Error::InvalidConfig(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").expect("parse empty config");
        assert_eq!(config.usage.session_limit, 45_000_000);
        assert_eq!(config.usage.weekly_limit, 180_000_000);
        assert_eq!(config.usage.cache_ttl_secs, 60);
        assert!(config.paths.bundled_skills_dir.is_none());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: Config = toml::from_str(
            r#"
            [paths]
            data_dir = "/srv/wr/data"

            [usage]
            session_limit = 1000
            "#,
        )
        .expect("parse partial config");
        assert_eq!(config.paths.data_dir, PathBuf::from("/srv/wr/data"));
        assert_eq!(config.usage.session_limit, 1000);
        assert_eq!(config.usage.weekly_limit, 180_000_000);
    }

    #[test]
    fn agent_config_file_lives_under_agent_dir() {
        let paths = PathsConfig {
            agent_dir: PathBuf::from("/tmp/agent"),
            ..PathsConfig::default()
        };
        assert_eq!(
            paths.agent_config_file(),
            PathBuf::from("/tmp/agent/agent.json")
        );
        assert_eq!(
            paths.managed_skills_dir(),
            PathBuf::from("/tmp/agent/skills")
        );
    }
}
