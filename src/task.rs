//! Task store for wr.
//!
//! Tasks live in a single `tasks.json` document (a JSON array). The store
//! manipulates records as raw `serde_json::Value` objects so legacy fields
//! survive rewrites untouched; typed [`Task`] values are produced at the
//! read boundary by a pure normalization pass that is never persisted.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use ulid::Ulid;

use crate::docs::{DocStore, TASKS_DOC};
use crate::error::{Error, Result};
use crate::queue;

const TASK_ID_SUFFIX_LEN: usize = 8;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "backlog" => Some(TaskStatus::Backlog),
            "todo" => Some(TaskStatus::Todo),
            "in-progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// Task priority; rank 0 is most urgent and sorts first in the queue
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            "urgent" => Some(TaskPriority::Urgent),
            _ => None,
        }
    }

    /// Queue sort rank: urgent=0, high=1, medium=2, low=3
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Urgent => 0,
            TaskPriority::High => 1,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 3,
        }
    }
}

/// Kind of a task reference, auto-detected from the URL when not supplied
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    #[default]
    Link,
    Obsidian,
    Doc,
}

impl ReferenceKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "link" => Some(ReferenceKind::Link),
            "obsidian" => Some(ReferenceKind::Obsidian),
            "doc" => Some(ReferenceKind::Doc),
            _ => None,
        }
    }
}

/// Detect the reference kind from the URL shape
pub fn detect_reference_kind(url: &str) -> ReferenceKind {
    if url.starts_with("obsidian://") {
        ReferenceKind::Obsidian
    } else if url.ends_with(".md") || url.ends_with(".txt") {
        ReferenceKind::Doc
    } else {
        ReferenceKind::Link
    }
}

/// A link or document attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub created_at: String,
}

/// A unit of work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project: Option<String>,
    pub tags: Vec<String>,
    pub skill: Option<String>,
    pub schedule: Option<String>,
    pub scheduled_at: Option<String>,
    pub references: Vec<Reference>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub picked_up: bool,
    pub created_at: String,
    pub updated_at: String,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

/// Partial update for a task.
///
/// Nullable fields are tri-state: absent leaves the stored value alone, an
/// explicit null clears it, a value replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub project: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub skill: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub schedule: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub scheduled_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub started_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub completed_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub result: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub error: Option<Option<String>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub estimated_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "some_or_null")]
    pub actual_hours: Option<Option<f64>>,
}

/// Distinguishes "field present with null" from "field absent"
pub(crate) fn some_or_null<'de, T, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

impl TaskPatch {
    fn apply(&self, obj: &mut Map<String, Value>) {
        set_present(obj, "title", &self.title);
        set_present(obj, "description", &self.description);
        set_present(obj, "status", &self.status);
        set_present(obj, "priority", &self.priority);
        set_present(obj, "tags", &self.tags);
        set_tri_state(obj, "project", &self.project);
        set_tri_state(obj, "skill", &self.skill);
        set_tri_state(obj, "schedule", &self.schedule);
        set_tri_state(obj, "scheduledAt", &self.scheduled_at);
        set_tri_state(obj, "startedAt", &self.started_at);
        set_tri_state(obj, "completedAt", &self.completed_at);
        set_tri_state(obj, "result", &self.result);
        set_tri_state(obj, "error", &self.error);
        set_tri_state(obj, "estimatedHours", &self.estimated_hours);
        set_tri_state(obj, "actualHours", &self.actual_hours);
    }
}

pub(crate) fn set_present<T: Serialize>(obj: &mut Map<String, Value>, key: &str, field: &Option<T>) {
    if let Some(value) = field {
        obj.insert(key.to_string(), json!(value));
    }
}

pub(crate) fn set_tri_state<T: Serialize>(
    obj: &mut Map<String, Value>,
    key: &str,
    field: &Option<Option<T>>,
) {
    match field {
        None => {}
        Some(None) => {
            obj.insert(key.to_string(), Value::Null);
        }
        Some(Some(value)) => {
            obj.insert(key.to_string(), json!(value));
        }
    }
}

/// Fields accepted when attaching a reference
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReference {
    pub title: String,
    pub url: String,
    /// Auto-detected from the URL when omitted
    #[serde(default, rename = "type")]
    pub kind: Option<ReferenceKind>,
}

/// Conjunctive task list filters
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Project id; the sentinel `untagged` selects tasks with no project
    pub project: Option<String>,
    pub priority: Option<TaskPriority>,
    /// Satisfied when the task carries at least one of these tags
    pub tags: Vec<String>,
    pub status: Option<TaskStatus>,
}

// -----------------------------------------------------------------------------
// Normalization (pure, idempotent, never persisted)
// -----------------------------------------------------------------------------

fn text(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Normalize a raw stored reference into the current shape.
///
/// Legacy records carry a bare `path` instead of `id`/`title`/`url`; those
/// gain fallback values derived from the path. Out-of-enum `type` values
/// coerce to `link`. Non-object entries are dropped.
pub fn normalize_reference(raw: &Value) -> Option<Reference> {
    let obj = raw.as_object()?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(ReferenceKind::parse)
        .unwrap_or(ReferenceKind::Link);

    let complete =
        obj.contains_key("id") && obj.contains_key("title") && obj.contains_key("url");
    if complete {
        return Some(Reference {
            id: text(obj, "id"),
            title: text(obj, "title"),
            url: text(obj, "url"),
            kind,
            created_at: text(obj, "createdAt"),
        });
    }

    let path = text(obj, "path");
    let fallback_title = path.rsplit('/').next().unwrap_or_default().to_string();
    Some(Reference {
        id: opt_text(obj, "id").unwrap_or_else(|| path.clone()),
        title: opt_text(obj, "title").unwrap_or(fallback_title),
        url: opt_text(obj, "url").unwrap_or_else(|| path.clone()),
        kind,
        created_at: text(obj, "createdAt"),
    })
}

/// Normalize a raw stored task into the current shape.
///
/// Unknown fields are ignored, out-of-enum status/priority fall back to the
/// model defaults, and references run through [`normalize_reference`]. Pure
/// and idempotent; callers must not write the result back.
pub fn normalize_task(raw: &Value) -> Option<Task> {
    let obj = raw.as_object()?;
    let references = obj
        .get("references")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(normalize_reference).collect())
        .unwrap_or_default();
    let tags = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Task {
        id: text(obj, "id"),
        title: text(obj, "title"),
        description: text(obj, "description"),
        status: obj
            .get("status")
            .and_then(Value::as_str)
            .and_then(TaskStatus::parse)
            .unwrap_or_default(),
        priority: obj
            .get("priority")
            .and_then(Value::as_str)
            .and_then(TaskPriority::parse)
            .unwrap_or_default(),
        project: opt_text(obj, "project"),
        tags,
        skill: opt_text(obj, "skill"),
        schedule: opt_text(obj, "schedule"),
        scheduled_at: opt_text(obj, "scheduledAt"),
        references,
        started_at: opt_text(obj, "startedAt"),
        completed_at: opt_text(obj, "completedAt"),
        result: opt_text(obj, "result"),
        error: opt_text(obj, "error"),
        picked_up: obj
            .get("pickedUp")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: text(obj, "createdAt"),
        updated_at: text(obj, "updatedAt"),
        estimated_hours: obj.get("estimatedHours").and_then(Value::as_f64),
        actual_hours: obj.get("actualHours").and_then(Value::as_f64),
    })
}

// -----------------------------------------------------------------------------
// Store
// -----------------------------------------------------------------------------

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

fn find_index(tasks: &[Value], id: &str) -> Option<usize> {
    tasks
        .iter()
        .position(|task| task.get("id").and_then(Value::as_str) == Some(id))
}

fn has_project(task: &Value) -> bool {
    task.get("project")
        .and_then(Value::as_str)
        .is_some_and(|project| !project.is_empty())
}

fn matches(filter: &TaskFilter, task: &Value) -> bool {
    if let Some(status) = filter.status {
        if task.get("status").and_then(Value::as_str) != Some(status.as_str()) {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if task.get("priority").and_then(Value::as_str) != Some(priority.as_str()) {
            return false;
        }
    }
    match filter.project.as_deref() {
        Some("untagged") => {
            if has_project(task) {
                return false;
            }
        }
        Some(project) => {
            if task.get("project").and_then(Value::as_str) != Some(project) {
                return false;
            }
        }
        None => {}
    }
    if !filter.tags.is_empty() {
        let any_tag = task
            .get("tags")
            .and_then(Value::as_array)
            .is_some_and(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .any(|tag| filter.tags.iter().any(|wanted| wanted == tag))
            });
        if !any_tag {
            return false;
        }
    }
    true
}

fn generate_task_id(tasks: &[Value]) -> String {
    loop {
        let raw = Ulid::new().to_string().to_ascii_lowercase();
        let candidate = raw[raw.len() - TASK_ID_SUFFIX_LEN..].to_string();
        let taken = tasks
            .iter()
            .any(|task| task.get("id").and_then(Value::as_str) == Some(candidate.as_str()));
        if !taken {
            return candidate;
        }
    }
}

/// Enforce `completedAt` non-null iff `status == done` after a mutation.
///
/// Entering done stamps the current time unless a value is already set;
/// any non-done status clears it.
fn enforce_completed_at(obj: &mut Map<String, Value>, was_done: bool) {
    let is_done = obj.get("status").and_then(Value::as_str) == Some("done");
    if is_done && !was_done {
        let missing = obj
            .get("completedAt")
            .map(|value| value.is_null() || value.as_str() == Some(""))
            .unwrap_or(true);
        if missing {
            obj.insert("completedAt".to_string(), json!(now_iso()));
        }
    }
    if !is_done {
        obj.insert("completedAt".to_string(), Value::Null);
    }
}

/// CRUD and lifecycle operations over the task document
#[derive(Debug, Clone)]
pub struct TaskStore {
    docs: Arc<DocStore>,
}

impl TaskStore {
    pub fn new(docs: Arc<DocStore>) -> Self {
        Self { docs }
    }

    fn doc(&self) -> PathBuf {
        self.docs.doc_path(TASKS_DOC)
    }

    async fn read_all(&self) -> Vec<Value> {
        self.docs.read(&self.doc(), Vec::new).await
    }

    /// List tasks matching the filter, normalized
    pub async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.read_all()
            .await
            .iter()
            .filter(|task| matches(filter, task))
            .filter_map(normalize_task)
            .collect()
    }

    /// Fetch a single task by id
    pub async fn get(&self, id: &str) -> Result<Task> {
        let tasks = self.read_all().await;
        tasks
            .iter()
            .find(|task| task.get("id").and_then(Value::as_str) == Some(id))
            .and_then(normalize_task)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Create a task; a blank title becomes "Untitled"
    pub async fn create(&self, new: NewTask) -> Result<Task> {
        let raw = self
            .docs
            .update(&self.doc(), Vec::new, |tasks: &mut Vec<Value>| {
                let id = generate_task_id(tasks);
                let now = now_iso();
                let title = if new.title.trim().is_empty() {
                    "Untitled".to_string()
                } else {
                    new.title.clone()
                };
                let skill = new.skill.as_deref().filter(|skill| !skill.is_empty());
                let mut task = json!({
                    "id": id,
                    "title": title,
                    "description": new.description,
                    "priority": new.priority,
                    "skill": skill,
                    "status": new.status,
                    "project": new.project,
                    "tags": new.tags,
                    "schedule": new.schedule,
                    "scheduledAt": new.scheduled_at,
                    "references": [],
                    "createdAt": now,
                    "updatedAt": now,
                    "completedAt": null,
                    "startedAt": null,
                    "result": null,
                    "error": null,
                    "pickedUp": false,
                    "estimatedHours": new.estimated_hours,
                    "actualHours": null,
                });
                if new.status == TaskStatus::Done {
                    task["completedAt"] = json!(now);
                }
                tasks.push(task.clone());
                Ok(task)
            })
            .await?;
        normalize_task(&raw).ok_or_else(|| Error::OperationFailed("task record invalid".into()))
    }

    /// Merge a partial update; refreshes `updatedAt` and keeps the
    /// `completedAt` invariant
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.mutate(id, move |obj| {
            let was_done = obj.get("status").and_then(Value::as_str) == Some("done");
            patch.apply(obj);
            obj.insert("updatedAt".to_string(), json!(now_iso()));
            enforce_completed_at(obj, was_done);
        })
        .await
    }

    /// Delete a task; returns whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.docs
            .update(&self.doc(), Vec::new, move |tasks: &mut Vec<Value>| {
                let before = tasks.len();
                tasks.retain(|task| task.get("id").and_then(Value::as_str) != Some(id.as_str()));
                Ok(tasks.len() != before)
            })
            .await
    }

    /// Force a task into `in-progress` immediately, stamping `startedAt`.
    ///
    /// Manual triggering: does not set `pickedUp`, so the queue still offers
    /// the task until a worker claims it.
    pub async fn run(&self, id: &str) -> Result<Task> {
        self.mutate(id, |obj| {
            let now = now_iso();
            obj.insert("status".to_string(), json!("in-progress"));
            obj.insert("startedAt".to_string(), json!(now));
            obj.insert("updatedAt".to_string(), json!(now));
        })
        .await
    }

    /// Idempotent worker claim: `pickedUp` goes true, status `in-progress`,
    /// and `startedAt` keeps its first-seen value across re-pickups
    pub async fn pickup(&self, id: &str) -> Result<Task> {
        self.mutate(id, |obj| {
            let now = now_iso();
            let started = obj
                .get("startedAt")
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| now.clone());
            obj.insert("pickedUp".to_string(), json!(true));
            obj.insert("status".to_string(), json!("in-progress"));
            obj.insert("startedAt".to_string(), json!(started));
            obj.insert("updatedAt".to_string(), json!(now));
        })
        .await
    }

    /// Finish a task: status `done`, `completedAt` stamped, result stored.
    /// An error string coexists with the result; it does not replace it.
    pub async fn complete(
        &self,
        id: &str,
        result: Option<String>,
        error: Option<String>,
    ) -> Result<Task> {
        self.mutate(id, move |obj| {
            let now = now_iso();
            obj.insert("status".to_string(), json!("done"));
            obj.insert("completedAt".to_string(), json!(now));
            obj.insert("updatedAt".to_string(), json!(now));
            obj.insert("result".to_string(), json!(result));
            if let Some(error) = error {
                obj.insert("error".to_string(), json!(error));
            }
        })
        .await
    }

    /// Tasks eligible for worker pickup, most urgent first
    pub async fn queue(&self) -> Vec<Task> {
        let tasks: Vec<Task> = self
            .read_all()
            .await
            .iter()
            .filter_map(normalize_task)
            .collect();
        queue::eligible_queue(tasks, Utc::now())
    }

    /// References attached to a task
    pub async fn references(&self, id: &str) -> Result<Vec<Reference>> {
        let task = self.get(id).await?;
        Ok(task.references)
    }

    /// Attach a reference, auto-detecting its kind from the URL when unset
    pub async fn add_reference(&self, id: &str, new: NewReference) -> Result<Reference> {
        let task_id = id.to_string();
        let raw = self
            .docs
            .update(&self.doc(), Vec::new, move |tasks: &mut Vec<Value>| {
                let idx = find_index(tasks, &task_id)
                    .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
                let reference_id = generate_task_id(tasks);
                let obj = tasks[idx]
                    .as_object_mut()
                    .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
                let kind = new.kind.unwrap_or_else(|| detect_reference_kind(&new.url));
                let reference = json!({
                    "id": reference_id,
                    "title": new.title,
                    "url": new.url,
                    "type": kind,
                    "createdAt": now_iso(),
                });
                if !obj.get("references").is_some_and(Value::is_array) {
                    obj.insert("references".to_string(), json!([]));
                }
                if let Some(references) =
                    obj.get_mut("references").and_then(Value::as_array_mut)
                {
                    references.push(reference.clone());
                }
                obj.insert("updatedAt".to_string(), json!(now_iso()));
                Ok(reference)
            })
            .await?;
        normalize_reference(&raw)
            .ok_or_else(|| Error::OperationFailed("reference record invalid".into()))
    }

    /// Remove a reference from a task
    pub async fn delete_reference(&self, id: &str, reference_id: &str) -> Result<()> {
        let task_id = id.to_string();
        let reference_id = reference_id.to_string();
        self.docs
            .update(&self.doc(), Vec::new, move |tasks: &mut Vec<Value>| {
                let idx = find_index(tasks, &task_id)
                    .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
                let obj = tasks[idx]
                    .as_object_mut()
                    .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
                let references = obj
                    .get_mut("references")
                    .and_then(Value::as_array_mut)
                    .ok_or_else(|| Error::ReferenceNotFound(reference_id.clone()))?;
                let before = references.len();
                references.retain(|reference| {
                    reference.get("id").and_then(Value::as_str) != Some(reference_id.as_str())
                });
                if references.len() == before {
                    return Err(Error::ReferenceNotFound(reference_id.clone()));
                }
                obj.insert("updatedAt".to_string(), json!(now_iso()));
                Ok(())
            })
            .await
    }

    /// Distinct sorted tags across all tasks
    pub async fn tags(&self) -> Vec<String> {
        let mut tags = BTreeSet::new();
        for task in self.read_all().await {
            if let Some(list) = task.get("tags").and_then(Value::as_array) {
                for tag in list.iter().filter_map(Value::as_str) {
                    tags.insert(tag.to_string());
                }
            }
        }
        tags.into_iter().collect()
    }

    async fn mutate(&self, id: &str, mutator: impl FnOnce(&mut Map<String, Value>)) -> Result<Task> {
        let task_id = id.to_string();
        let raw = self
            .docs
            .update(&self.doc(), Vec::new, move |tasks: &mut Vec<Value>| {
                let idx = find_index(tasks, &task_id)
                    .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
                let obj = tasks[idx]
                    .as_object_mut()
                    .ok_or_else(|| Error::TaskNotFound(task_id.clone()))?;
                mutator(obj);
                Ok(tasks[idx].clone())
            })
            .await?;
        normalize_task(&raw).ok_or_else(|| Error::OperationFailed("task record invalid".into()))
    }
}
