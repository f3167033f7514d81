//! JSON document store
//!
//! Every dashboard document family (tasks, projects, heartbeat, agent
//! config, per-file history) is one JSON file guarded by one in-process
//! async mutex. The critical section spans read-modify-write, so two
//! concurrent mutations of the same family never lose an update. Blocking
//! filesystem calls run on the tokio blocking pool.
//!
//! Reads never fail: a missing or corrupt document yields the caller's
//! default. Writes are atomic (temp file + rename) and do propagate errors.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task;

use crate::error::Result;

/// Document name for the task collection
pub const TASKS_DOC: &str = "tasks.json";

/// Document name for the project collection
pub const PROJECTS_DOC: &str = "projects.json";

/// Document name for the heartbeat timestamp
pub const HEARTBEAT_DOC: &str = "heartbeat.json";

/// Store of named JSON documents under a data directory
#[derive(Debug)]
pub struct DocStore {
    data_dir: PathBuf,
    families: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DocStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            families: StdMutex::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a named document inside the data directory
    pub fn doc_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Acquire the family lock for a document.
    ///
    /// Compound operations (workspace write + history snapshot) hold this
    /// guard across the whole sequence and use the `_raw` accessors inside.
    pub async fn lock_family(&self, doc: &Path) -> OwnedMutexGuard<()> {
        let family = {
            let mut families = self.families.lock().expect("family registry poisoned");
            families
                .entry(doc.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        family.lock_owned().await
    }

    /// Read a document under its family lock
    pub async fn read<T>(&self, doc: &Path, default: impl FnOnce() -> T) -> T
    where
        T: DeserializeOwned,
    {
        let _guard = self.lock_family(doc).await;
        self.read_raw(doc, default).await
    }

    /// Write a document under its family lock
    pub async fn write<T: Serialize>(&self, doc: &Path, value: &T) -> Result<()> {
        let _guard = self.lock_family(doc).await;
        self.write_raw(doc, value).await
    }

    /// Read-modify-write a document under its family lock.
    ///
    /// The mutated document is persisted only when the mutator succeeds.
    pub async fn update<T, R, F>(
        &self,
        doc: &Path,
        default: impl FnOnce() -> T,
        mutate: F,
    ) -> Result<R>
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let _guard = self.lock_family(doc).await;
        let mut value = self.read_raw(doc, default).await;
        let outcome = mutate(&mut value)?;
        self.write_raw(doc, &value).await?;
        Ok(outcome)
    }

    /// Read without taking the family lock; the caller holds the guard
    pub async fn read_raw<T>(&self, doc: &Path, default: impl FnOnce() -> T) -> T
    where
        T: DeserializeOwned,
    {
        let path = doc.to_path_buf();
        let raw = task::spawn_blocking(move || fs::read_to_string(&path).ok())
            .await
            .ok()
            .flatten();
        match raw {
            Some(text) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(doc = %doc.display(), %err, "corrupt document, using default");
                    default()
                }
            },
            None => default(),
        }
    }

    /// Write without taking the family lock; the caller holds the guard
    pub async fn write_raw<T: Serialize>(&self, doc: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        let path = doc.to_path_buf();
        task::spawn_blocking(move || write_atomic(&path, json.as_bytes())).await??;
        Ok(())
    }
}

/// Write data atomically using temp file + rename.
///
/// Readers never observe a partial document: the file is either fully
/// written or untouched. Parent directories are created as needed.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}
