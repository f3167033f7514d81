//! wr workspace-file command implementations.
//!
//! Name validation happens here, before any store operation runs: only the
//! fixed allow-list of workspace documents is reachable.

use crate::cli::{App, WsCommands};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::workspace::{self, SOUL_TEMPLATES};

fn ensure_allowed(name: &str) -> Result<()> {
    if workspace::is_allowed(name) {
        Ok(())
    } else {
        Err(Error::FileNotAllowed(name.to_string()))
    }
}

pub(crate) async fn dispatch(app: &App, options: OutputOptions, command: WsCommands) -> Result<()> {
    match command {
        WsCommands::Get { name } => {
            ensure_allowed(&name)?;
            let file = app.workspace().read(&name).await;
            let mut human = HumanOutput::new(name.clone());
            human.push_summary(
                "modified",
                file.last_modified.clone().unwrap_or_else(|| "never".to_string()),
            );
            human.push_detail(file.content.clone());
            emit_success(options, "ws.get", &file, Some(&human))
        }

        WsCommands::Put {
            name,
            content,
            file,
        } => {
            ensure_allowed(&name)?;
            let content = match (content, file) {
                (Some(_), Some(_)) => {
                    return Err(Error::InvalidArgument(
                        "--content conflicts with --file".to_string(),
                    ))
                }
                (Some(content), None) => content,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => {
                    return Err(Error::InvalidArgument(
                        "provide --content or --file".to_string(),
                    ))
                }
            };
            app.workspace().write(&name, content).await?;
            let mut human = HumanOutput::new("Workspace file written");
            human.push_summary("name", name.clone());
            emit_success(
                options,
                "ws.put",
                &serde_json::json!({ "name": name }),
                Some(&human),
            )
        }

        WsCommands::History { name } => {
            ensure_allowed(&name)?;
            let history = app.workspace().history(&name).await;
            let mut human = HumanOutput::new(format!("{} snapshot(s)", history.len()));
            for (index, entry) in history.iter().enumerate() {
                human.push_detail(format!(
                    "[{index}] {} ({} chars)",
                    entry.timestamp,
                    entry.content.len()
                ));
            }
            emit_success(options, "ws.history", &history, Some(&human))
        }

        WsCommands::Revert { name, index } => {
            ensure_allowed(&name)?;
            let file = app.workspace().revert(&name, index).await?;
            let mut human = HumanOutput::new("Workspace file reverted");
            human.push_summary("name", name.clone());
            human.push_summary("index", index.to_string());
            emit_success(options, "ws.revert", &file, Some(&human))
        }

        WsCommands::Templates => {
            let mut human = HumanOutput::new(format!("{} template(s)", SOUL_TEMPLATES.len()));
            for template in SOUL_TEMPLATES {
                human.push_detail(format!("{}: {}", template.name, template.description));
            }
            emit_success(options, "ws.templates", &SOUL_TEMPLATES, Some(&human))
        }
    }
}
