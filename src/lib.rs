//! wr - War Room Orchestration Library
//!
//! This library provides the core functionality for the wr CLI tool: the
//! mutable state engine behind an autonomous-agent dashboard.
//!
//! # Core Concepts
//!
//! - **Documents**: each state family (tasks, projects, heartbeat, history)
//!   is one JSON file guarded by one in-process lock
//! - **Queue**: the derived, ordered set of tasks eligible for worker pickup
//! - **Pickup**: an idempotent worker claim, distinct from merely starting
//! - **Workspace files**: an allow-listed set of editable documents, each
//!   with a capped linear history and revert
//! - **Usage ledger**: rolling-window token accounting over session logs
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `wr.toml`
//! - `docs`: JSON document store with per-family locking and atomic writes
//! - `error`: Error types and result aliases
//! - `task`: Task CRUD, lifecycle transitions, references, tags
//! - `queue`: Queue extraction for autonomous workers
//! - `project`: Project CRUD with the referential-integrity delete check
//! - `workspace`: Versioned workspace files and soul templates
//! - `usage`: Usage ledger over per-session logs
//! - `models`: Shared agent model configuration
//! - `heartbeat`: Last-seen heartbeat document
//! - `skills`: Skill catalogue scanning and management
//! - `stats`: Overview stats and the activity calendar
//! - `output`: CLI output envelopes

pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod heartbeat;
pub mod models;
pub mod output;
pub mod project;
pub mod queue;
pub mod skills;
pub mod stats;
pub mod task;
pub mod usage;
pub mod workspace;

pub use error::{Error, Result};
