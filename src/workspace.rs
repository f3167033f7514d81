//! Versioned workspace files.
//!
//! A fixed allow-list of named text documents in the agent workspace, each
//! paired with a capped linear history in a sibling `<name>-history.json`.
//! Writes snapshot the prior content before overwriting, and a revert
//! snapshots the live content first so it is itself undoable.
//!
//! Name validation is boundary work: callers reject names outside
//! [`WORKSPACE_FILES`] before any store operation runs.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::docs::{write_atomic, DocStore};
use crate::error::{Error, Result};

/// The four editable workspace documents
pub const WORKSPACE_FILES: [&str; 4] = ["SOUL.md", "IDENTITY.md", "USER.md", "AGENTS.md"];

/// Maximum retained history entries per file; oldest are evicted
pub const HISTORY_CAP: usize = 20;

/// Is the name on the workspace-file allow-list?
pub fn is_allowed(name: &str) -> bool {
    WORKSPACE_FILES.contains(&name)
}

/// Live content of a workspace file
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFile {
    pub content: String,
    /// Filesystem mtime; `None` when the file does not exist
    pub last_modified: Option<String>,
}

/// One captured prior state of a workspace file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub content: String,
}

/// A starting-content preset for the soul editor
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SoulTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

/// Static catalogue of persona presets offered by the workspace editor
pub const SOUL_TEMPLATES: [SoulTemplate; 6] = [
    SoulTemplate {
        name: "Minimal Assistant",
        description: "Bare bones, helpful, no personality",
        content: "# SOUL.md\nBe helpful. Be concise. No fluff.",
    },
    SoulTemplate {
        name: "Friendly Companion",
        description: "Warm, conversational, uses emoji",
        content: "# SOUL.md - Who You Are\nYou're warm, friendly, and genuinely care about helping. Use emoji naturally (not excessively). Be conversational — talk like a smart friend, not a manual. Have opinions, crack jokes when appropriate, and remember: helpfulness > formality.",
    },
    SoulTemplate {
        name: "Technical Expert",
        description: "Precise, detailed, code-focused",
        content: "# SOUL.md - Who You Are\nYou are a senior technical consultant. Be precise, thorough, and opinionated about best practices. Prefer code examples over explanations. Flag anti-patterns when you see them. Don't sugarcoat — if something is wrong, say so directly. Efficiency matters.",
    },
    SoulTemplate {
        name: "Creative Partner",
        description: "Imaginative, brainstormy, enthusiastic",
        content: "# SOUL.md - Who You Are\nYou're a creative collaborator — curious, imaginative, and always looking for unexpected angles. Brainstorm freely. Suggest wild ideas alongside safe ones. Get excited about good concepts. Push creative boundaries while staying grounded in what's achievable.",
    },
    SoulTemplate {
        name: "Stern Operator",
        description: "No-nonsense, military-efficient, dry humor",
        content: "# SOUL.md - Who You Are\nMission first. Be direct, efficient, and zero-waste in communication. No pleasantries unless earned. Dry humor is acceptable. Report status clearly. Flag risks immediately. You don't ask permission for routine ops — you execute and report. Save the small talk for after the job's done.",
    },
    SoulTemplate {
        name: "Sarcastic Sidekick",
        description: "Witty, slightly snarky, still helpful",
        content: "# SOUL.md - Who You Are\nYou're helpful, but you're not going to pretend everything is sunshine and rainbows. Deliver assistance with a side of wit. Be sarcastic when it's funny, never when it's cruel. You still get the job done — you just have commentary while doing it. Think dry British humor meets competent engineer.",
    },
];

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

fn cap_history(history: &mut Vec<HistoryEntry>) {
    while history.len() > HISTORY_CAP {
        history.remove(0);
    }
}

/// Read/write/revert over the allow-listed workspace documents
#[derive(Debug, Clone)]
pub struct WorkspaceFiles {
    workspace_dir: PathBuf,
    docs: Arc<DocStore>,
}

impl WorkspaceFiles {
    pub fn new(workspace_dir: impl Into<PathBuf>, docs: Arc<DocStore>) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            docs,
        }
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(name)
    }

    fn history_doc(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(format!("{name}-history.json"))
    }

    /// Live content and mtime; a missing file is empty, not an error
    pub async fn read(&self, name: &str) -> WorkspaceFile {
        let path = self.file_path(name);
        task::spawn_blocking(move || {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(_) => {
                    return WorkspaceFile {
                        content: String::new(),
                        last_modified: None,
                    }
                }
            };
            let last_modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .ok()
                .map(|mtime| DateTime::<Utc>::from(mtime).to_rfc3339());
            WorkspaceFile {
                content,
                last_modified,
            }
        })
        .await
        .unwrap_or(WorkspaceFile {
            content: String::new(),
            last_modified: None,
        })
    }

    /// Overwrite a workspace file, snapshotting prior non-blank content
    /// into its history first
    pub async fn write(&self, name: &str, content: String) -> Result<()> {
        let history_doc = self.history_doc(name);
        let _guard = self.docs.lock_family(&history_doc).await;

        let path = self.file_path(name);
        let old = read_live(path.clone()).await;
        if let Some(old) = old.filter(|old| !old.trim().is_empty()) {
            let mut history: Vec<HistoryEntry> =
                self.docs.read_raw(&history_doc, Vec::new).await;
            history.push(HistoryEntry {
                timestamp: now_iso(),
                content: old,
            });
            cap_history(&mut history);
            self.docs.write_raw(&history_doc, &history).await?;
        }

        write_live(path, content).await
    }

    /// Full capped history, oldest first
    pub async fn history(&self, name: &str) -> Vec<HistoryEntry> {
        self.docs.read(&self.history_doc(name), Vec::new).await
    }

    /// Restore the content captured at `index`, snapshotting the live
    /// content first so the revert can itself be reverted
    pub async fn revert(&self, name: &str, index: usize) -> Result<WorkspaceFile> {
        let history_doc = self.history_doc(name);
        let _guard = self.docs.lock_family(&history_doc).await;

        let mut history: Vec<HistoryEntry> = self.docs.read_raw(&history_doc, Vec::new).await;
        let target = history
            .get(index)
            .map(|entry| entry.content.clone())
            .ok_or(Error::HistoryIndexOutOfRange {
                index,
                len: history.len(),
            })?;

        let path = self.file_path(name);
        let live = read_live(path.clone()).await;
        if let Some(live) = live.filter(|live| !live.trim().is_empty()) {
            history.push(HistoryEntry {
                timestamp: now_iso(),
                content: live,
            });
            cap_history(&mut history);
            self.docs.write_raw(&history_doc, &history).await?;
        }

        write_live(path, target.clone()).await?;
        Ok(WorkspaceFile {
            content: target,
            last_modified: Some(now_iso()),
        })
    }
}

async fn read_live(path: PathBuf) -> Option<String> {
    task::spawn_blocking(move || fs::read_to_string(&path).ok())
        .await
        .ok()
        .flatten()
}

async fn write_live(path: PathBuf, content: String) -> Result<()> {
    task::spawn_blocking(move || write_atomic(&path, content.as_bytes())).await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_exact() {
        for name in WORKSPACE_FILES {
            assert!(is_allowed(name));
        }
        assert!(!is_allowed("NOTES.md"));
        assert!(!is_allowed("soul.md"), "names are case-sensitive");
        assert!(!is_allowed("../SOUL.md"));
    }

    #[test]
    fn history_cap_evicts_oldest() {
        let mut history: Vec<HistoryEntry> = (0..25)
            .map(|i| HistoryEntry {
                timestamp: format!("t{i}"),
                content: format!("c{i}"),
            })
            .collect();
        cap_history(&mut history);
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history[0].content, "c5", "oldest entries dropped");
        assert_eq!(history.last().unwrap().content, "c24");
    }

    #[test]
    fn templates_include_the_minimal_default() {
        assert!(SOUL_TEMPLATES
            .iter()
            .any(|template| template.name == "Minimal Assistant"));
        assert_eq!(SOUL_TEMPLATES.len(), 6);
    }
}
