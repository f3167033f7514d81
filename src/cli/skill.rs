//! wr skill command implementations.

use crate::cli::{App, SkillCommands};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::skills::NewSkill;

pub(crate) async fn dispatch(
    app: &App,
    options: OutputOptions,
    command: SkillCommands,
) -> Result<()> {
    match command {
        SkillCommands::List => {
            let skills = app.skills().list().await?;
            let mut human = HumanOutput::new(format!("{} skill(s)", skills.len()));
            for skill in &skills {
                let state = if skill.enabled { "on" } else { "off" };
                human.push_detail(format!("{} [{state}] {}", skill.id, skill.description));
            }
            emit_success(options, "skill.list", &skills, Some(&human))
        }

        SkillCommands::Show { id } => {
            let content = app.skills().content(&id).await?;
            let mut human = HumanOutput::new(id.clone());
            human.push_detail(content.clone());
            emit_success(
                options,
                "skill.show",
                &serde_json::json!({ "id": id, "content": content }),
                Some(&human),
            )
        }

        SkillCommands::New {
            name,
            description,
            instructions,
        } => {
            let skill = app
                .skills()
                .create(NewSkill {
                    name,
                    description,
                    instructions,
                })
                .await?;
            let mut human = HumanOutput::new("Skill created");
            human.push_summary("id", skill.id.clone());
            emit_success(options, "skill.new", &skill, Some(&human))
        }

        SkillCommands::Toggle { id, on, off } => {
            let enabled = match (on, off) {
                (true, true) => {
                    return Err(Error::InvalidArgument(
                        "--on conflicts with --off".to_string(),
                    ))
                }
                (true, false) => Some(true),
                (false, true) => Some(false),
                (false, false) => None,
            };
            let skill = app.skills().toggle(&id, enabled).await?;
            let mut human = HumanOutput::new("Skill toggled");
            human.push_summary("id", skill.id.clone());
            human.push_summary("enabled", skill.enabled.to_string());
            emit_success(options, "skill.toggle", &skill, Some(&human))
        }

        SkillCommands::Delete { id } => {
            app.skills().delete(&id).await?;
            let mut human = HumanOutput::new("Skill deleted");
            human.push_summary("id", id.clone());
            emit_success(
                options,
                "skill.delete",
                &serde_json::json!({ "id": id }),
                Some(&human),
            )
        }
    }
}
