use anyhow::{anyhow, Result};
use cadence_core::models::{TaskFilter, TaskPriority, TaskStatus};
use cadence_core::repository::Repository;

use crate::cli::ListCommand;
use crate::views::table::{display_tasks, ViewTask};

pub async fn list_tasks(repo: &impl Repository, command: ListCommand) -> Result<()> {
    let status = command
        .status
        .as_ref()
        .map(|s| {
            s.parse::<TaskStatus>()
                .map_err(|e| anyhow!("{} (expected pending|completed|cancelled)", e))
        })
        .transpose()?;
    let priority = command
        .priority
        .as_ref()
        .map(|p| {
            p.parse::<TaskPriority>()
                .map_err(|e| anyhow!("{} (expected none|low|medium|high)", e))
        })
        .transpose()?;

    let filter = TaskFilter {
        status,
        priority,
        project: command.project,
        tag: command.tag,
        include_closed: command.all,
    };

    let tasks = repo.find_tasks(&filter).await?;

    let view_tasks: Vec<ViewTask> = tasks
        .into_iter()
        .map(|t| {
            let tags = t
                .tags
                .map_or_else(Vec::new, |s| s.split(',').map(String::from).collect());
            ViewTask {
                id: t.id,
                name: t.name,
                status: t.status,
                priority: t.priority,
                due_at: t.due_at,
                project_name: t.project_name,
                tags,
                recurring: t.recurring,
            }
        })
        .collect();

    display_tasks(&view_tasks);

    Ok(())
}
