//! Command-line interface for wr
//!
//! This module defines the CLI structure using clap derive macros. Each
//! subcommand group is implemented in its own submodule. The CLI is the
//! boundary layer: it validates names and arguments, then calls into the
//! library stores and renders their results.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::docs::DocStore;
use crate::error::Result;
use crate::heartbeat::HeartbeatStore;
use crate::models::AgentConfigStore;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::project::ProjectStore;
use crate::skills::SkillCatalog;
use crate::stats;
use crate::task::TaskStore;
use crate::usage::{UsageCache, UsageLedger};
use crate::workspace::WorkspaceFiles;

mod project;
mod skill;
mod task;
mod ws;

/// wr - War Room
///
/// Task and project orchestration for autonomous agents: a prioritized work
/// queue, the pickup/complete protocol, versioned workspace files, and
/// usage-quota accounting.
#[derive(Parser, Debug)]
#[command(name = "wr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the wr.toml config file
    #[arg(long, global = true, env = "WR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Task lifecycle and queue
    #[command(subcommand)]
    Task(TaskCommands),

    /// References attached to a task
    #[command(subcommand)]
    Ref(RefCommands),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Workspace files (SOUL.md and friends) with history and revert
    #[command(subcommand)]
    Ws(WsCommands),

    /// Skill catalogue
    #[command(subcommand)]
    Skill(SkillCommands),

    /// Current usage snapshot
    Usage,

    /// Model configuration
    #[command(subcommand)]
    Model(ModelCommands),

    /// Agent heartbeat
    #[command(subcommand)]
    Heartbeat(HeartbeatCommands),

    /// Overview stats
    Stats,

    /// Activity calendar
    Calendar,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks with optional filters
    List {
        /// Project id, or `untagged` for tasks with no project
        #[arg(long)]
        project: Option<String>,

        /// Priority: low, medium, high, urgent
        #[arg(long)]
        priority: Option<String>,

        /// Comma-separated tags; matches tasks carrying any of them
        #[arg(long)]
        tags: Option<String>,

        /// Status: backlog, todo, in-progress, done
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a single task
    Show { id: String },

    /// Create a task
    New {
        /// Task title
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Priority: low, medium, high, urgent
        #[arg(long, default_value = "medium")]
        priority: String,

        /// Status: backlog, todo, in-progress, done
        #[arg(long, default_value = "backlog")]
        status: String,

        #[arg(long)]
        project: Option<String>,

        /// Tag; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        skill: Option<String>,

        /// Schedule descriptor: asap, next-heartbeat, or an ISO timestamp
        #[arg(long)]
        schedule: Option<String>,

        #[arg(long)]
        scheduled_at: Option<String>,

        #[arg(long)]
        estimated_hours: Option<f64>,
    },

    /// Update task fields
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        project: Option<String>,

        /// Detach the task from its project
        #[arg(long)]
        clear_project: bool,

        /// Replace the tag set; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        skill: Option<String>,

        #[arg(long)]
        clear_skill: bool,

        #[arg(long)]
        schedule: Option<String>,

        #[arg(long)]
        clear_schedule: bool,

        #[arg(long)]
        scheduled_at: Option<String>,

        #[arg(long)]
        clear_scheduled_at: bool,

        #[arg(long)]
        estimated_hours: Option<f64>,

        #[arg(long)]
        actual_hours: Option<f64>,
    },

    /// Delete a task
    Delete { id: String },

    /// Force a task to run now (in-progress, startedAt stamped)
    Run { id: String },

    /// Tasks eligible for worker pickup, most urgent first
    Queue,

    /// Claim a task as a worker (idempotent)
    Pickup { id: String },

    /// Finish a task with an optional result and error
    Complete {
        id: String,

        #[arg(long)]
        result: Option<String>,

        #[arg(long)]
        error: Option<String>,
    },

    /// Distinct tags in use across tasks
    Tags,
}

#[derive(Subcommand, Debug)]
pub enum RefCommands {
    /// List a task's references
    List { task: String },

    /// Attach a reference to a task
    Add {
        task: String,
        title: String,
        url: String,

        /// Kind: link, obsidian, doc; auto-detected from the URL when unset
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Remove a reference from a task
    Delete { task: String, id: String },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects with task counts
    List,

    /// Create a project
    New {
        /// Project id, referenced by tasks
        id: String,
        name: String,

        #[arg(long, default_value = "")]
        icon: String,

        #[arg(long, default_value = "")]
        color: String,

        #[arg(long)]
        description: Option<String>,

        /// Status: active, paused, archived
        #[arg(long, default_value = "active")]
        status: String,

        /// Display sort order
        #[arg(long, default_value_t = 0)]
        order: i64,
    },

    /// Update project fields
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        icon: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        clear_description: bool,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        order: Option<i64>,
    },

    /// Delete a project (refused while tasks reference it)
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WsCommands {
    /// Print a workspace file
    Get { name: String },

    /// Overwrite a workspace file, snapshotting the prior content
    Put {
        name: String,

        /// New content
        #[arg(long)]
        content: Option<String>,

        /// Read the new content from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show a file's capped history, oldest first
    History { name: String },

    /// Restore the content captured at a history index
    Revert { name: String, index: usize },

    /// List soul templates
    Templates,
}

#[derive(Subcommand, Debug)]
pub enum SkillCommands {
    /// List skills across all sources
    List,

    /// Print a skill's SKILL.md
    Show { id: String },

    /// Create a workspace skill
    New {
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        instructions: String,
    },

    /// Toggle a skill, or set it explicitly with --on/--off
    Toggle {
        id: String,

        #[arg(long)]
        on: bool,

        #[arg(long)]
        off: bool,
    },

    /// Delete a workspace skill
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommands {
    /// Configured model identifiers
    List,

    /// Set the active model
    Set { model: String },
}

#[derive(Subcommand, Debug)]
pub enum HeartbeatCommands {
    /// Last recorded heartbeat
    Get,

    /// Record a heartbeat now
    Beat,
}

/// Shared handle to the configured stores
pub(crate) struct App {
    config: Config,
    docs: Arc<DocStore>,
}

impl App {
    fn new(config: Config) -> Self {
        let docs = Arc::new(DocStore::new(config.paths.data_dir.clone()));
        Self { config, docs }
    }

    pub(crate) fn tasks(&self) -> TaskStore {
        TaskStore::new(self.docs.clone())
    }

    pub(crate) fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.docs.clone())
    }

    pub(crate) fn workspace(&self) -> WorkspaceFiles {
        WorkspaceFiles::new(self.config.paths.workspace_dir.clone(), self.docs.clone())
    }

    pub(crate) fn heartbeat(&self) -> HeartbeatStore {
        HeartbeatStore::new(self.docs.clone())
    }

    pub(crate) fn models(&self) -> AgentConfigStore {
        AgentConfigStore::new(self.config.paths.agent_config_file(), self.docs.clone())
    }

    pub(crate) fn skills(&self) -> SkillCatalog {
        SkillCatalog::new(&self.config, self.docs.clone())
    }

    pub(crate) fn usage(&self) -> UsageLedger {
        let ttl = Duration::from_secs(self.config.usage.cache_ttl_secs);
        UsageLedger::new(&self.config, self.models(), UsageCache::new(ttl))
    }
}

impl Cli {
    /// Entry point: build the runtime and dispatch the parsed command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.dispatch())
    }

    async fn dispatch(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let app = App::new(config);
        let options = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Task(command) => task::dispatch(&app, options, command).await,
            Commands::Ref(command) => task::dispatch_refs(&app, options, command).await,
            Commands::Project(command) => project::dispatch(&app, options, command).await,
            Commands::Ws(command) => ws::dispatch(&app, options, command).await,
            Commands::Skill(command) => skill::dispatch(&app, options, command).await,
            Commands::Usage => usage(&app, options).await,
            Commands::Model(command) => model(&app, options, command).await,
            Commands::Heartbeat(command) => heartbeat(&app, options, command).await,
            Commands::Stats => overview(&app, options).await,
            Commands::Calendar => calendar(&app, options).await,
        }
    }
}

async fn usage(app: &App, options: OutputOptions) -> Result<()> {
    let snapshot = app.usage().snapshot().await?;
    let mut human = HumanOutput::new(format!("Usage ({})", snapshot.model));
    for tier in &snapshot.tiers {
        human.push_summary(
            tier.label.clone(),
            format!("{}% (resets in {})", tier.percent, tier.resets_in),
        );
    }
    emit_success(options, "usage", &snapshot, Some(&human))
}

async fn model(app: &App, options: OutputOptions, command: ModelCommands) -> Result<()> {
    match command {
        ModelCommands::List => {
            let models = app.models().models().await;
            let mut human = HumanOutput::new(format!("{} model(s)", models.len()));
            for model in &models {
                human.push_detail(model.clone());
            }
            emit_success(options, "model.list", &models, Some(&human))
        }
        ModelCommands::Set { model } => {
            app.models().set_model(&model).await?;
            let mut human = HumanOutput::new("Model updated");
            human.push_summary("model", model.clone());
            emit_success(
                options,
                "model.set",
                &serde_json::json!({ "model": model }),
                Some(&human),
            )
        }
    }
}

async fn heartbeat(app: &App, options: OutputOptions, command: HeartbeatCommands) -> Result<()> {
    match command {
        HeartbeatCommands::Get => {
            let beat = app.heartbeat().get().await;
            let mut human = HumanOutput::new("Heartbeat");
            human.push_summary(
                "last",
                beat.last_heartbeat
                    .map(|ms| ms.to_string())
                    .unwrap_or_else(|| "never".to_string()),
            );
            emit_success(options, "heartbeat.get", &beat, Some(&human))
        }
        HeartbeatCommands::Beat => {
            let beat = app.heartbeat().record().await?;
            let mut human = HumanOutput::new("Heartbeat recorded");
            human.push_summary(
                "last",
                beat.last_heartbeat
                    .map(|ms| ms.to_string())
                    .unwrap_or_default(),
            );
            emit_success(options, "heartbeat.beat", &beat, Some(&human))
        }
    }
}

async fn overview(app: &App, options: OutputOptions) -> Result<()> {
    let stats =
        stats::war_room_stats(&app.tasks(), &app.heartbeat(), &app.models()).await?;
    let mut human = HumanOutput::new("War Room");
    human.push_summary("in progress", stats.in_progress_count.to_string());
    human.push_summary("todo", stats.todo_count.to_string());
    human.push_summary("model", stats.active_model.clone());
    emit_success(options, "stats", &stats, Some(&human))
}

async fn calendar(app: &App, options: OutputOptions) -> Result<()> {
    let days = stats::calendar(&app.tasks(), &app.config.paths.memory_dir).await?;
    let mut human = HumanOutput::new(format!("{} day(s) with activity", days.len()));
    for (day, activity) in &days {
        let memory = if activity.memory { " [memory]" } else { "" };
        human.push_detail(format!("{day}: {} task(s){memory}", activity.tasks.len()));
    }
    emit_success(options, "calendar", &days, Some(&human))
}
