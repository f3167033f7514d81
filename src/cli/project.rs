//! wr project command implementations.

use crate::cli::{App, ProjectCommands};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::project::{NewProject, ProjectPatch, ProjectStatus};

fn parse_status(raw: &str) -> Result<ProjectStatus> {
    ProjectStatus::parse(raw)
        .ok_or_else(|| Error::InvalidArgument(format!("unknown project status: {raw}")))
}

pub(crate) async fn dispatch(
    app: &App,
    options: OutputOptions,
    command: ProjectCommands,
) -> Result<()> {
    match command {
        ProjectCommands::List => {
            let projects = app.projects().list().await;
            let mut human = HumanOutput::new(format!("{} project(s)", projects.len()));
            for entry in &projects {
                human.push_detail(format!(
                    "{} [{}] {} ({} task(s))",
                    entry.project.id,
                    entry.project.status.as_str(),
                    entry.project.name,
                    entry.task_count
                ));
            }
            emit_success(options, "project.list", &projects, Some(&human))
        }

        ProjectCommands::New {
            id,
            name,
            icon,
            color,
            description,
            status,
            order,
        } => {
            let new = NewProject {
                id,
                name,
                icon,
                color,
                description,
                status: parse_status(&status)?,
                order,
            };
            let project = app.projects().create(new).await?;
            let mut human = HumanOutput::new("Project created");
            human.push_summary("id", project.id.clone());
            human.push_summary("name", project.name.clone());
            emit_success(options, "project.new", &project, Some(&human))
        }

        ProjectCommands::Edit {
            id,
            name,
            icon,
            color,
            description,
            clear_description,
            status,
            order,
        } => {
            if description.is_some() && clear_description {
                return Err(Error::InvalidArgument(
                    "--description conflicts with --clear-description".to_string(),
                ));
            }
            let patch = ProjectPatch {
                name,
                icon,
                color,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                status: status.as_deref().map(parse_status).transpose()?,
                order,
            };
            let project = app.projects().update(&id, patch).await?;
            let mut human = HumanOutput::new("Project updated");
            human.push_summary("id", project.id.clone());
            human.push_summary("name", project.name.clone());
            emit_success(options, "project.edit", &project, Some(&human))
        }

        ProjectCommands::Delete { id } => {
            app.projects().delete(&id).await?;
            let mut human = HumanOutput::new("Project deleted");
            human.push_summary("id", id.clone());
            emit_success(
                options,
                "project.delete",
                &serde_json::json!({ "id": id }),
                Some(&human),
            )
        }
    }
}
