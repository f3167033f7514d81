//! wr task and ref command implementations.

use crate::cli::{App, RefCommands, TaskCommands};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{
    NewReference, NewTask, ReferenceKind, Task, TaskFilter, TaskPatch, TaskPriority, TaskStatus,
};

pub(crate) fn parse_status(raw: &str) -> Result<TaskStatus> {
    TaskStatus::parse(raw)
        .ok_or_else(|| Error::InvalidArgument(format!("unknown status: {raw}")))
}

pub(crate) fn parse_priority(raw: &str) -> Result<TaskPriority> {
    TaskPriority::parse(raw)
        .ok_or_else(|| Error::InvalidArgument(format!("unknown priority: {raw}")))
}

fn parse_kind(raw: &str) -> Result<ReferenceKind> {
    ReferenceKind::parse(raw)
        .ok_or_else(|| Error::InvalidArgument(format!("unknown reference type: {raw}")))
}

/// Resolve a set/clear flag pair into a tri-state patch field
fn tri_state<T>(value: Option<T>, clear: bool, flag: &str) -> Result<Option<Option<T>>> {
    match (value, clear) {
        (Some(_), true) => Err(Error::InvalidArgument(format!(
            "--{flag} conflicts with --clear-{flag}"
        ))),
        (Some(value), false) => Ok(Some(Some(value))),
        (None, true) => Ok(Some(None)),
        (None, false) => Ok(None),
    }
}

fn task_line(task: &Task) -> String {
    format!(
        "{} [{}/{}] {}",
        task.id,
        task.status.as_str(),
        task.priority.as_str(),
        task.title
    )
}

fn task_human(header: &str, task: &Task) -> HumanOutput {
    let mut human = HumanOutput::new(header.to_string());
    human.push_summary("id", task.id.clone());
    human.push_summary("title", task.title.clone());
    human.push_summary("status", task.status.as_str());
    human.push_summary("priority", task.priority.as_str());
    if let Some(project) = &task.project {
        human.push_summary("project", project.clone());
    }
    human
}

pub(crate) async fn dispatch(app: &App, options: OutputOptions, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::List {
            project,
            priority,
            tags,
            status,
        } => {
            let filter = TaskFilter {
                project,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                tags: tags
                    .map(|raw| {
                        raw.split(',')
                            .map(|tag| tag.trim().to_string())
                            .filter(|tag| !tag.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                status: status.as_deref().map(parse_status).transpose()?,
            };
            let tasks = app.tasks().list(&filter).await;
            let mut human = HumanOutput::new(format!("{} task(s)", tasks.len()));
            for task in &tasks {
                human.push_detail(task_line(task));
            }
            emit_success(options, "task.list", &tasks, Some(&human))
        }

        TaskCommands::Show { id } => {
            let task = app.tasks().get(&id).await?;
            emit_success(options, "task.show", &task, Some(&task_human("Task", &task)))
        }

        TaskCommands::New {
            title,
            description,
            priority,
            status,
            project,
            tags,
            skill,
            schedule,
            scheduled_at,
            estimated_hours,
        } => {
            let new = NewTask {
                title,
                description,
                priority: parse_priority(&priority)?,
                status: parse_status(&status)?,
                project,
                tags,
                skill,
                schedule,
                scheduled_at,
                estimated_hours,
            };
            let task = app.tasks().create(new).await?;
            emit_success(
                options,
                "task.new",
                &task,
                Some(&task_human("Task created", &task)),
            )
        }

        TaskCommands::Edit {
            id,
            title,
            description,
            priority,
            status,
            project,
            clear_project,
            tags,
            skill,
            clear_skill,
            schedule,
            clear_schedule,
            scheduled_at,
            clear_scheduled_at,
            estimated_hours,
            actual_hours,
        } => {
            let patch = TaskPatch {
                title,
                description,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                status: status.as_deref().map(parse_status).transpose()?,
                project: tri_state(project, clear_project, "project")?,
                tags: if tags.is_empty() { None } else { Some(tags) },
                skill: tri_state(skill, clear_skill, "skill")?,
                schedule: tri_state(schedule, clear_schedule, "schedule")?,
                scheduled_at: tri_state(scheduled_at, clear_scheduled_at, "scheduled-at")?,
                estimated_hours: estimated_hours.map(Some),
                actual_hours: actual_hours.map(Some),
                ..TaskPatch::default()
            };
            let task = app.tasks().update(&id, patch).await?;
            emit_success(
                options,
                "task.edit",
                &task,
                Some(&task_human("Task updated", &task)),
            )
        }

        TaskCommands::Delete { id } => {
            let existed = app.tasks().delete(&id).await?;
            let mut human = HumanOutput::new(if existed {
                "Task deleted"
            } else {
                "Task not found"
            });
            human.push_summary("id", id.clone());
            emit_success(
                options,
                "task.delete",
                &serde_json::json!({ "id": id, "deleted": existed }),
                Some(&human),
            )
        }

        TaskCommands::Run { id } => {
            let task = app.tasks().run(&id).await?;
            emit_success(
                options,
                "task.run",
                &task,
                Some(&task_human("Task running", &task)),
            )
        }

        TaskCommands::Queue => {
            let queue = app.tasks().queue().await;
            let mut human = HumanOutput::new(format!("{} task(s) eligible", queue.len()));
            for task in &queue {
                human.push_detail(task_line(task));
            }
            emit_success(options, "task.queue", &queue, Some(&human))
        }

        TaskCommands::Pickup { id } => {
            let task = app.tasks().pickup(&id).await?;
            emit_success(
                options,
                "task.pickup",
                &task,
                Some(&task_human("Task picked up", &task)),
            )
        }

        TaskCommands::Complete { id, result, error } => {
            let task = app.tasks().complete(&id, result, error).await?;
            emit_success(
                options,
                "task.complete",
                &task,
                Some(&task_human("Task completed", &task)),
            )
        }

        TaskCommands::Tags => {
            let tags = app.tasks().tags().await;
            let mut human = HumanOutput::new(format!("{} tag(s)", tags.len()));
            for tag in &tags {
                human.push_detail(tag.clone());
            }
            emit_success(options, "task.tags", &tags, Some(&human))
        }
    }
}

pub(crate) async fn dispatch_refs(
    app: &App,
    options: OutputOptions,
    command: RefCommands,
) -> Result<()> {
    match command {
        RefCommands::List { task } => {
            let references = app.tasks().references(&task).await?;
            let mut human = HumanOutput::new(format!("{} reference(s)", references.len()));
            for reference in &references {
                human.push_detail(format!(
                    "{} [{:?}] {} -> {}",
                    reference.id, reference.kind, reference.title, reference.url
                ));
            }
            emit_success(options, "ref.list", &references, Some(&human))
        }

        RefCommands::Add {
            task,
            title,
            url,
            kind,
        } => {
            let new = NewReference {
                title,
                url,
                kind: kind.as_deref().map(parse_kind).transpose()?,
            };
            let reference = app.tasks().add_reference(&task, new).await?;
            let mut human = HumanOutput::new("Reference added");
            human.push_summary("id", reference.id.clone());
            human.push_summary("url", reference.url.clone());
            emit_success(options, "ref.add", &reference, Some(&human))
        }

        RefCommands::Delete { task, id } => {
            app.tasks().delete_reference(&task, &id).await?;
            let mut human = HumanOutput::new("Reference deleted");
            human.push_summary("id", id.clone());
            emit_success(
                options,
                "ref.delete",
                &serde_json::json!({ "id": id }),
                Some(&human),
            )
        }
    }
}
