//! Skill catalogue.
//!
//! Skills are directories carrying a `SKILL.md` with YAML-ish frontmatter.
//! Three sources are scanned in order: bundled (read-only, optional),
//! managed (under the agent home), and workspace. Enablement lives in the
//! shared agent config document under `skills.entries.<id>.enabled` and
//! defaults to on. Only workspace skills can be created or deleted.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task;

use crate::config::Config;
use crate::docs::DocStore;
use crate::error::{Error, Result};
use crate::models::ensure_object;

/// Where a skill was discovered
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SkillSource {
    Bundled,
    Managed,
    Workspace,
}

/// A discovered skill
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: SkillSource,
    pub enabled: bool,
    pub path: String,
    pub has_metadata: bool,
}

/// Fields accepted when creating a workspace skill
#[derive(Debug, Clone, Default)]
pub struct NewSkill {
    pub name: String,
    pub description: String,
    pub instructions: String,
}

fn frontmatter_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^---\r?\n([\s\S]*?)\r?\n---").expect("frontmatter regex"))
}

fn frontmatter_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w[\w\s]*?):\s*(.+)$").expect("frontmatter line regex"))
}

/// Parse `key: value` pairs out of a leading `---` frontmatter block;
/// keys are lowercased, values lose surrounding quotes
pub fn parse_frontmatter(content: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let Some(block) = frontmatter_block().captures(content) else {
        return fields;
    };
    for line in block[1].lines() {
        if let Some(pair) = frontmatter_line().captures(line) {
            let key = pair[1].trim().to_lowercase();
            let value = pair[2]
                .trim()
                .trim_matches(|ch| ch == '"' || ch == '\'')
                .to_string();
            fields.insert(key, value);
        }
    }
    fields
}

/// Scan and manage the skill directories
#[derive(Debug, Clone)]
pub struct SkillCatalog {
    bundled_dir: Option<PathBuf>,
    managed_dir: PathBuf,
    workspace_dir: PathBuf,
    agent_config: PathBuf,
    docs: Arc<DocStore>,
}

impl SkillCatalog {
    pub fn new(config: &Config, docs: Arc<DocStore>) -> Self {
        Self {
            bundled_dir: config.paths.bundled_skills_dir.clone(),
            managed_dir: config.paths.managed_skills_dir(),
            workspace_dir: config.paths.workspace_skills_dir(),
            agent_config: config.paths.agent_config_file(),
            docs,
        }
    }

    fn sources(&self) -> Vec<(SkillSource, PathBuf)> {
        let mut dirs = Vec::new();
        if let Some(bundled) = &self.bundled_dir {
            dirs.push((SkillSource::Bundled, bundled.clone()));
        }
        dirs.push((SkillSource::Managed, self.managed_dir.clone()));
        dirs.push((SkillSource::Workspace, self.workspace_dir.clone()));
        dirs
    }

    /// All discovered skills with enablement flags applied
    pub async fn list(&self) -> Result<Vec<Skill>> {
        let config: Value = self.docs.read(&self.agent_config, || json!({})).await;
        let dirs = self.sources();
        let mut skills = task::spawn_blocking(move || scan_sources(&dirs)).await?;

        let entries = config.pointer("/skills/entries").cloned();
        for skill in &mut skills {
            skill.enabled = entries
                .as_ref()
                .and_then(|entries| entries.get(&skill.id))
                .and_then(|entry| entry.get("enabled"))
                .and_then(Value::as_bool)
                .unwrap_or(true);
        }
        Ok(skills)
    }

    async fn find(&self, id: &str) -> Result<Skill> {
        self.list()
            .await?
            .into_iter()
            .find(|skill| skill.id == id)
            .ok_or_else(|| Error::SkillNotFound(id.to_string()))
    }

    /// Flip (or explicitly set) a skill's enabled flag in the shared agent
    /// config, preserving sibling entry fields
    pub async fn toggle(&self, id: &str, enabled: Option<bool>) -> Result<Skill> {
        // toggling an unknown id still records the flag; surface not-found
        // only after the config write, like a lookup would
        let skill_id = id.to_string();
        self.docs
            .update(&self.agent_config, || json!({}), move |config: &mut Value| {
                if !config.is_object() {
                    *config = json!({});
                }
                let entries =
                    ensure_object(ensure_object(config, "skills"), "entries");
                let current = entries
                    .get(&skill_id)
                    .and_then(|entry| entry.get("enabled"))
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let next = enabled.unwrap_or(!current);
                let entry = ensure_object(entries, &skill_id);
                entry["enabled"] = json!(next);
                Ok(())
            })
            .await?;
        self.find(id).await
    }

    /// Create a workspace skill and return its catalogue entry
    pub async fn create(&self, new: NewSkill) -> Result<Skill> {
        let skill_dir = self.workspace_dir.join(&new.name);
        let markdown = format!(
            "---\nname: {}\ndescription: {}\n---\n\n{}",
            new.name, new.description, new.instructions
        );
        task::spawn_blocking(move || -> std::io::Result<()> {
            fs::create_dir_all(&skill_dir)?;
            fs::write(skill_dir.join("SKILL.md"), markdown)
        })
        .await??;
        self.find(&new.name).await
    }

    /// Raw SKILL.md content of a skill
    pub async fn content(&self, id: &str) -> Result<String> {
        let skill = self.find(id).await?;
        let path = PathBuf::from(skill.path).join("SKILL.md");
        let skill_id = id.to_string();
        task::spawn_blocking(move || {
            fs::read_to_string(&path).map_err(|_| Error::SkillNotFound(skill_id))
        })
        .await?
    }

    /// Delete a skill; only workspace skills are deletable
    pub async fn delete(&self, id: &str) -> Result<()> {
        let skill = self.find(id).await?;
        if skill.source != SkillSource::Workspace {
            return Err(Error::SkillNotDeletable(id.to_string()));
        }
        let path = PathBuf::from(skill.path);
        task::spawn_blocking(move || fs::remove_dir_all(&path)).await??;
        Ok(())
    }
}

/// Walk the source directories; unreadable directories or files are
/// skipped, never fatal
fn scan_sources(dirs: &[(SkillSource, PathBuf)]) -> Vec<Skill> {
    let mut skills = Vec::new();
    for (source, directory) in dirs {
        let Ok(entries) = fs::read_dir(directory) else {
            continue;
        };
        let mut children: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        children.sort();

        for child in children {
            let Some(id) = child.file_name().map(|name| name.to_string_lossy().to_string())
            else {
                continue;
            };
            let mut fields = HashMap::new();
            let mut has_metadata = false;
            if let Ok(content) = fs::read_to_string(child.join("SKILL.md")) {
                fields = parse_frontmatter(&content);
                has_metadata = !fields.is_empty();
            }
            skills.push(Skill {
                name: fields.get("name").cloned().unwrap_or_else(|| id.clone()),
                description: fields.get("description").cloned().unwrap_or_default(),
                source: *source,
                enabled: true,
                path: child.to_string_lossy().to_string(),
                has_metadata,
                id,
            });
        }
    }
    skills
}
