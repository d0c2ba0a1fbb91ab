use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::Task;
use cadence_core::repository::Repository;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::cli::{TrashCommand, TrashSubcommand};
use crate::views::table::{display_tasks, ViewTask};

pub async fn trash_command(repo: &impl Repository, command: TrashCommand) -> Result<()> {
    match command.command {
        TrashSubcommand::List => {
            let trashed = repo.find_trashed_tasks().await?;
            if trashed.is_empty() {
                println!("The trash is empty.");
                return Ok(());
            }
            let view_tasks: Vec<ViewTask> = trashed
                .into_iter()
                .map(|t| ViewTask {
                    id: t.id,
                    name: t.name,
                    status: t.status,
                    priority: t.priority,
                    due_at: t.due_at,
                    project_name: None,
                    tags: vec![],
                    recurring: false,
                })
                .collect();
            display_tasks(&view_tasks);
            Ok(())
        }
        TrashSubcommand::Restore(cmd) => {
            // The usual short-ID lookup skips trashed rows, so match here
            let task = resolve_trashed_task(repo, &cmd.id).await?;
            let restored = repo.restore_task(task.id).await?;
            println!(
                "{} Restored task: '{}'",
                "✓".green().bold(),
                restored.name
            );
            Ok(())
        }
        TrashSubcommand::Empty(cmd) => {
            let trashed = repo.find_trashed_tasks().await?;
            if trashed.is_empty() {
                println!("The trash is already empty.");
                return Ok(());
            }
            if !cmd.force {
                let confirmation = Confirm::new()
                    .with_prompt(format!(
                        "Permanently delete {} task(s) from the trash?",
                        trashed.len()
                    ))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmation {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            let purged = repo.empty_trash().await?;
            println!("{} Permanently deleted {} task(s)", "✓".green().bold(), purged);
            Ok(())
        }
    }
}

async fn resolve_trashed_task(repo: &impl Repository, short_id: &str) -> Result<Task> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let prefix = short_id.replace('-', "").to_lowercase();
    let trashed = repo.find_trashed_tasks().await?;
    let mut matches: Vec<Task> = trashed
        .into_iter()
        .filter(|t| t.id.simple().to_string().starts_with(&prefix))
        .collect();

    if matches.len() == 1 {
        Ok(matches.remove(0))
    } else if matches.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No trashed task found with ID prefix '{}'",
            short_id
        ))))
    } else {
        Err(anyhow!(CoreError::AmbiguousId(
            matches
                .into_iter()
                .map(|t| (t.id.to_string(), t.name))
                .collect()
        )))
    }
}
