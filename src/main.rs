//! wr - War Room CLI
//!
//! A standalone CLI for the task/project orchestration engine behind an
//! autonomous-agent dashboard: prioritized work queue, pickup/complete
//! protocol, versioned workspace files, and usage-quota accounting.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wr::cli::Cli;
use wr::output::{emit_error, infer_command_name_from_args};

fn main() {
    // Tracing is opt-in via RUST_LOG.
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
