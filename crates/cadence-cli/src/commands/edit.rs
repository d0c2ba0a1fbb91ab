use anyhow::{anyhow, Result};
use cadence_core::models::{TaskPriority, UpdateTaskData};
use cadence_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::EditCommand;
use crate::parser::parse_due_date;
use crate::util::resolve_task_id;

pub async fn edit_task(repo: &impl Repository, command: EditCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };

    let due_at = if command.due_clear {
        Some(None)
    } else {
        command
            .due
            .as_ref()
            .map(|d| parse_due_date(d).map(Some))
            .transpose()?
    };

    let project_name = if command.project_clear {
        Some(None)
    } else {
        command.project.map(Some)
    };

    let priority = command
        .priority
        .as_ref()
        .map(|p| {
            p.parse::<TaskPriority>()
                .map_err(|e| anyhow!("{} (expected none|low|medium|high)", e))
        })
        .transpose()?;

    let data = UpdateTaskData {
        name: command.name,
        description,
        due_at,
        priority,
        status: None,
        project_name,
        add_tags: if command.add_tag.is_empty() {
            None
        } else {
            Some(command.add_tag)
        },
        remove_tags: if command.remove_tag.is_empty() {
            None
        } else {
            Some(command.remove_tag)
        },
    };

    let updated = repo.update_task(task_id, data).await?;
    println!("{} Updated task: '{}'", "✓".green().bold(), updated.name);

    Ok(())
}
