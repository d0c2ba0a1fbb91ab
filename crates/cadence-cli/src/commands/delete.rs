use anyhow::Result;
use cadence_core::repository::Repository;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::cli::DeleteCommand;
use crate::util::resolve_task_id;

pub async fn delete_task(repo: &impl Repository, command: DeleteCommand) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    let task = repo
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Task with ID '{}' not found", task_id))?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Move task '{}' to the trash?",
                task.name
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    repo.trash_task(task_id).await?;
    println!(
        "Moved '{}' to the trash. Restore it with: cadence trash restore {}",
        task.name,
        (&task_id.to_string()[..7]).yellow()
    );

    Ok(())
}
