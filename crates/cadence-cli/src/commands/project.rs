use anyhow::Result;
use cadence_core::repository::Repository;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::cli::{ProjectCommand, ProjectSubcommand};
use crate::views::table::{display_projects, ViewProject};

pub async fn project_command(repo: &impl Repository, command: ProjectCommand) -> Result<()> {
    match command.command {
        ProjectSubcommand::Add(cmd) => {
            let project = repo.add_project(cmd.name, cmd.description).await?;
            println!(
                "{} Created project: {}",
                "✓".green().bold(),
                project.name.bright_white().bold()
            );
            Ok(())
        }
        ProjectSubcommand::List => {
            let projects = repo.find_projects().await?;
            let view_projects: Vec<ViewProject> = projects
                .into_iter()
                .map(|p| ViewProject {
                    id: p.id,
                    name: p.name,
                    description: p.description,
                    created_at: p.created_at,
                })
                .collect();
            display_projects(&view_projects);
            Ok(())
        }
        ProjectSubcommand::Delete(cmd) => {
            if !cmd.force {
                let confirmation = Confirm::new()
                    .with_prompt(format!("Delete project '{}'?", cmd.name))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmation {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }
            repo.delete_project(cmd.name.clone()).await?;
            println!("{} Deleted project '{}'", "✓".green().bold(), cmd.name);
            Ok(())
        }
    }
}
