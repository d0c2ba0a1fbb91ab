use anyhow::{anyhow, Result};
use cadence_core::models::{Frequency, NewRecurrence, NewTaskData, TaskPriority, WeekdaySet};
use cadence_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::config::Config;
use crate::parser::{parse_date, parse_days_string, parse_due_date, parse_time_string};
use crate::timezone::today_in;

pub async fn add_task(repo: &impl Repository, command: AddCommand, config: &Config) -> Result<()> {
    let due_at = command.due.as_ref().map(|d| parse_due_date(d)).transpose()?;
    let priority = command
        .priority
        .as_ref()
        .map(|p| {
            p.parse::<TaskPriority>()
                .map_err(|e| anyhow!("{} (expected none|low|medium|high)", e))
        })
        .transpose()?;

    let recurrence = match &command.every {
        Some(every) => Some(build_recurrence(every, &command, due_at, config)?),
        None => None,
    };

    let new_task_data = NewTaskData {
        name: command.name,
        description: command.description,
        due_at,
        priority,
        project_name: command.project,
        project_id: None,
        tags: command.tag,
        recurrence,
    };

    let is_recurring = new_task_data.recurrence.is_some();
    let added_task = repo.add_task(new_task_data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if is_recurring {
        println!(
            "{} Created recurring task: {}",
            "✓".style(success_style),
            added_task.name.bright_white().bold()
        );
        println!(
            "  {} Task ID: {}",
            "→".style(info_style),
            added_task.id.to_string().yellow()
        );
        println!(
            "  {} Preview upcoming: cadence recur preview {}",
            "→".style(info_style),
            (&added_task.id.to_string()[..7]).yellow()
        );
    } else {
        println!(
            "{} Created task: {}",
            "✓".style(success_style),
            added_task.name.bright_white().bold()
        );
        println!(
            "  {} Task ID: {}",
            "→".style(info_style),
            added_task.id.to_string().yellow()
        );
        if let Some(due) = added_task.due_at {
            println!(
                "  {} Due: {}",
                "→".style(info_style),
                due.format("%Y-%m-%d %H:%M").to_string().cyan()
            );
        }
    }

    Ok(())
}

/// Assemble the recurrence settings from the `--every` family of flags.
fn build_recurrence(
    every: &str,
    command: &AddCommand,
    due_at: Option<chrono::DateTime<chrono::Utc>>,
    config: &Config,
) -> Result<NewRecurrence> {
    // "weekdays"/"weekends" are shorthand for a weekly rule with the mask
    // already filled in
    let (frequency, mut days_of_week) = match every.trim().to_lowercase().as_str() {
        "weekdays" | "workdays" => (Frequency::Weekly, WeekdaySet::weekdays()),
        "weekends" => (Frequency::Weekly, WeekdaySet::weekend()),
        other => {
            let frequency = other
                .parse::<Frequency>()
                .map_err(|e| anyhow!("{} (expected daily|weekly|monthly|yearly)", e))?;
            (frequency, WeekdaySet::empty())
        }
    };

    if let Some(days) = &command.on {
        days_of_week = parse_days_string(days)?;
    }

    let anchor_start = match &command.from {
        Some(from) => parse_date(from)?,
        None => match due_at {
            Some(due) => due.date_naive(),
            None => today_in(&config.default_timezone)?,
        },
    };
    let anchor_end = command.until.as_ref().map(|u| parse_date(u)).transpose()?;
    let at_time = command.at.as_ref().map(|a| parse_time_string(a)).transpose()?;

    Ok(NewRecurrence {
        frequency,
        interval: command.interval.unwrap_or(1),
        anchor_start,
        anchor_end,
        days_of_week,
        at_time,
    })
}
