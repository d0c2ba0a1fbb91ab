use anyhow::Result;
use cadence_core::models::CompletionResult;
use cadence_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::DoCommand;
use crate::config::Config;
use crate::parser::parse_date;
use crate::timezone::today_in;
use crate::util::resolve_task_id;

pub async fn do_task(repo: &impl Repository, command: DoCommand, config: &Config) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;

    let on = match &command.on {
        Some(date) => Some(parse_date(date)?),
        // Recurring tasks complete one occurrence at a time; default to today
        None => match repo.find_rule_for_task(task_id).await? {
            Some(_) => Some(today_in(&config.default_timezone)?),
            None => None,
        },
    };

    match repo.complete_task(task_id, on).await? {
        CompletionResult::Single(task) => {
            println!("{} Completed task: '{}'", "✓".green().bold(), task.name);
        }
        CompletionResult::Occurrence {
            task,
            applied,
            next_occurrence,
        } => {
            println!(
                "{} Completed '{}' for {}",
                "✓".green().bold(),
                task.name,
                applied.occurrence_date.to_string().cyan()
            );
            match next_occurrence {
                Some(next) => println!("  Next occurrence: {}", next.to_string().cyan()),
                None => println!("  No further occurrences (rule has ended)"),
            }
        }
    }

    Ok(())
}
