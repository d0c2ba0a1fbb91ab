use anyhow::Result;
use cadence_core::models::CompletionResult;
use cadence_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::CancelCommand;
use crate::config::Config;
use crate::parser::parse_date;
use crate::timezone::today_in;
use crate::util::resolve_task_id;

pub async fn cancel_task(
    repo: &impl Repository,
    command: CancelCommand,
    config: &Config,
) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;

    let on = match &command.on {
        Some(date) => Some(parse_date(date)?),
        None => match repo.find_rule_for_task(task_id).await? {
            Some(_) => Some(today_in(&config.default_timezone)?),
            None => None,
        },
    };

    match repo.cancel_task(task_id, on).await? {
        CompletionResult::Single(task) => {
            println!("Cancelled task: '{}'", task.name);
        }
        CompletionResult::Occurrence { task, applied, .. } => {
            println!(
                "Cancelled '{}' for {}",
                task.name,
                applied.occurrence_date.to_string().cyan()
            );
            println!("  The rest of the series is untouched");
        }
    }

    Ok(())
}
