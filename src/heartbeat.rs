//! Heartbeat document.
//!
//! A single "last seen" epoch-millisecond timestamp recorded by the agent
//! loop and consumed by the scheduler's `next-heartbeat` sentinel and by
//! external health reporting.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::docs::{DocStore, HEARTBEAT_DOC};
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub last_heartbeat: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct HeartbeatStore {
    docs: Arc<DocStore>,
}

impl HeartbeatStore {
    pub fn new(docs: Arc<DocStore>) -> Self {
        Self { docs }
    }

    fn doc(&self) -> PathBuf {
        self.docs.doc_path(HEARTBEAT_DOC)
    }

    pub async fn get(&self) -> Heartbeat {
        self.docs.read(&self.doc(), Heartbeat::default).await
    }

    /// Stamp the current time and return the recorded value
    pub async fn record(&self) -> Result<Heartbeat> {
        let beat = Heartbeat {
            last_heartbeat: Some(Utc::now().timestamp_millis()),
        };
        self.docs.write(&self.doc(), &beat).await?;
        Ok(beat)
    }
}
