//! Project store for wr.
//!
//! Projects group tasks; the task side of the link is `Task.project`, a
//! caller-supplied project id. The one cross-entity invariant — a project
//! with live task references cannot be deleted — is enforced here at write
//! time by consulting the task document.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::docs::{DocStore, PROJECTS_DOC, TASKS_DOC};
use crate::error::{Error, Result};
use crate::task::{set_present, set_tri_state, some_or_null};

/// Display/lifecycle state of a project
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Archived => "archived",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(ProjectStatus::Active),
            "paused" => Some(ProjectStatus::Paused),
            "archived" => Some(ProjectStatus::Archived),
            _ => None,
        }
    }
}

/// A named task grouping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Caller-supplied id, referenced by `Task.project`
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Display sort order only
    pub order: i64,
}

/// Fields accepted when creating a project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub order: i64,
}

/// Partial update for a project
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl ProjectPatch {
    fn apply(&self, obj: &mut Map<String, Value>) {
        set_present(obj, "name", &self.name);
        set_present(obj, "icon", &self.icon);
        set_present(obj, "color", &self.color);
        set_present(obj, "status", &self.status);
        set_present(obj, "order", &self.order);
        set_tri_state(obj, "description", &self.description);
    }
}

/// A project joined with its referencing-task count
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectWithCount {
    #[serde(flatten)]
    pub project: Project,
    pub task_count: usize,
}

/// Normalize a raw stored project; unknown fields are ignored and an
/// out-of-enum status falls back to `active`
pub fn normalize_project(raw: &Value) -> Option<Project> {
    let obj = raw.as_object()?;
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(Project {
        id: text("id"),
        name: text("name"),
        icon: text("icon"),
        color: text("color"),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        status: obj
            .get("status")
            .and_then(Value::as_str)
            .and_then(ProjectStatus::parse)
            .unwrap_or_default(),
        order: obj.get("order").and_then(Value::as_i64).unwrap_or(0),
    })
}

/// CRUD over the project document with the referential-integrity check
#[derive(Debug, Clone)]
pub struct ProjectStore {
    docs: Arc<DocStore>,
}

impl ProjectStore {
    pub fn new(docs: Arc<DocStore>) -> Self {
        Self { docs }
    }

    fn doc(&self) -> PathBuf {
        self.docs.doc_path(PROJECTS_DOC)
    }

    fn tasks_doc(&self) -> PathBuf {
        self.docs.doc_path(TASKS_DOC)
    }

    /// Count of tasks referencing each project id requires a full task
    /// scan; fine at document-store scale.
    async fn task_count(&self, project_id: &str) -> usize {
        let tasks: Vec<Value> = self.docs.read(&self.tasks_doc(), Vec::new).await;
        tasks
            .iter()
            .filter(|task| task.get("project").and_then(Value::as_str) == Some(project_id))
            .count()
    }

    /// All projects with task counts, ascending by display order
    pub async fn list(&self) -> Vec<ProjectWithCount> {
        let projects: Vec<Value> = self.docs.read(&self.doc(), Vec::new).await;
        let tasks: Vec<Value> = self.docs.read(&self.tasks_doc(), Vec::new).await;

        let mut result: Vec<ProjectWithCount> = projects
            .iter()
            .filter_map(normalize_project)
            .map(|project| {
                let task_count = tasks
                    .iter()
                    .filter(|task| {
                        task.get("project").and_then(Value::as_str) == Some(project.id.as_str())
                    })
                    .count();
                ProjectWithCount {
                    project,
                    task_count,
                }
            })
            .collect();
        result.sort_by_key(|entry| entry.project.order);
        result
    }

    /// Fetch a single project by id
    pub async fn get(&self, id: &str) -> Result<Project> {
        let projects: Vec<Value> = self.docs.read(&self.doc(), Vec::new).await;
        projects
            .iter()
            .find(|project| project.get("id").and_then(Value::as_str) == Some(id))
            .and_then(normalize_project)
            .ok_or_else(|| Error::ProjectNotFound(id.to_string()))
    }

    pub async fn create(&self, new: NewProject) -> Result<Project> {
        let raw = self
            .docs
            .update(&self.doc(), Vec::new, move |projects: &mut Vec<Value>| {
                let project = json!({
                    "id": new.id,
                    "name": new.name,
                    "icon": new.icon,
                    "color": new.color,
                    "description": new.description,
                    "status": new.status,
                    "order": new.order,
                });
                projects.push(project.clone());
                Ok(project)
            })
            .await?;
        normalize_project(&raw)
            .ok_or_else(|| Error::OperationFailed("project record invalid".into()))
    }

    pub async fn update(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let project_id = id.to_string();
        let raw = self
            .docs
            .update(&self.doc(), Vec::new, move |projects: &mut Vec<Value>| {
                let idx = projects
                    .iter()
                    .position(|project| {
                        project.get("id").and_then(Value::as_str) == Some(project_id.as_str())
                    })
                    .ok_or_else(|| Error::ProjectNotFound(project_id.clone()))?;
                let obj = projects[idx]
                    .as_object_mut()
                    .ok_or_else(|| Error::ProjectNotFound(project_id.clone()))?;
                patch.apply(obj);
                Ok(projects[idx].clone())
            })
            .await?;
        normalize_project(&raw)
            .ok_or_else(|| Error::OperationFailed("project record invalid".into()))
    }

    /// Delete a project unless tasks still reference it.
    ///
    /// The referential check reads the task family without holding its lock
    /// across the delete; a task created in that narrow window can reference
    /// a project that no longer exists. Accepted consistency level, matching
    /// the per-family locking discipline.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.task_count(id).await > 0 {
            return Err(Error::ProjectInUse(id.to_string()));
        }

        let project_id = id.to_string();
        self.docs
            .update(&self.doc(), Vec::new, move |projects: &mut Vec<Value>| {
                let before = projects.len();
                projects.retain(|project| {
                    project.get("id").and_then(Value::as_str) != Some(project_id.as_str())
                });
                if projects.len() == before {
                    return Err(Error::ProjectNotFound(project_id.clone()));
                }
                Ok(())
            })
            .await
    }
}
