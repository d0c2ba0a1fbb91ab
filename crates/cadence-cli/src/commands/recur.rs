use anyhow::{anyhow, Result};
use cadence_core::models::{OccurrenceStatus, RecurrenceRule, UpdateRuleData};
use cadence_core::repository::Repository;
use comfy_table::Table;
use owo_colors::OwoColorize;

use crate::cli::{
    RecurCommand, RecurEndCommand, RecurInfoCommand, RecurOverridesCommand,
    RecurPreviewCommand, RecurRemoveOverrideCommand, RecurRescheduleCommand, RecurSubcommand,
};
use crate::config::Config;
use crate::parser::{parse_date, parse_time_string};
use crate::timezone::today_in;
use crate::util::resolve_task_id;

pub async fn recur_command(
    repo: &impl Repository,
    command: RecurCommand,
    config: &Config,
) -> Result<()> {
    match command.command {
        RecurSubcommand::Info(cmd) => info_command(repo, cmd, config).await,
        RecurSubcommand::Preview(cmd) => preview_command(repo, cmd, config).await,
        RecurSubcommand::Reschedule(cmd) => reschedule_command(repo, cmd).await,
        RecurSubcommand::Overrides(cmd) => overrides_command(repo, cmd).await,
        RecurSubcommand::RemoveOverride(cmd) => remove_override_command(repo, cmd).await,
        RecurSubcommand::End(cmd) => end_command(repo, cmd).await,
    }
}

/// Resolve a short task ID to its recurrence rule.
async fn resolve_rule(repo: &impl Repository, short_id: &str) -> Result<RecurrenceRule> {
    let task_id = resolve_task_id(repo, short_id).await?;
    repo.find_rule_for_task(task_id)
        .await?
        .ok_or_else(|| anyhow!("Task '{}' is not recurring", short_id))
}

fn describe_rule(rule: &RecurrenceRule) -> String {
    let mut text = if rule.interval == 1 {
        format!("{}", rule.frequency)
    } else {
        format!("every {} {}s", rule.interval, unit_name(rule))
    };
    if !rule.days_of_week.is_empty() {
        text.push_str(&format!(" on {}", rule.days_of_week));
    }
    if let Some(at) = rule.at_time {
        text.push_str(&format!(" at {}", at.format("%H:%M")));
    }
    text
}

fn unit_name(rule: &RecurrenceRule) -> &'static str {
    use cadence_core::models::Frequency;
    match rule.frequency {
        Frequency::Daily => "day",
        Frequency::Weekly => "week",
        Frequency::Monthly => "month",
        Frequency::Yearly => "year",
    }
}

async fn info_command(
    repo: &impl Repository,
    command: RecurInfoCommand,
    config: &Config,
) -> Result<()> {
    let rule = resolve_rule(repo, &command.id).await?;
    let task = repo
        .find_task_by_id(rule.task_id)
        .await?
        .ok_or_else(|| anyhow!("Task not found"))?;
    let overrides = repo.find_overrides(rule.id).await?;

    println!("{}", "Recurrence".blue().bold());
    println!("Task: {} ({})", task.name.cyan(), task.id.to_string().yellow());
    println!("Repeats: {}", describe_rule(&rule).green());
    println!("Starts: {}", rule.anchor_start);
    match rule.anchor_end {
        Some(end) => println!("Ends: {}", end),
        None => println!("Ends: never"),
    }
    if !overrides.is_empty() {
        println!("Overridden occurrences: {}", overrides.len());
    }
    println!();

    println!("{}", "Next 5 Occurrences".blue().bold());
    let today = today_in(&config.default_timezone)?;
    let occurrences = repo.preview_rule(rule.id, today, 5).await?;

    if occurrences.is_empty() {
        println!("No upcoming occurrences (rule may have ended)");
    } else {
        for (i, occurrence) in occurrences.iter().enumerate() {
            let marker = match occurrence.status {
                OccurrenceStatus::Completed => " (completed)".green().to_string(),
                OccurrenceStatus::Cancelled => " (cancelled)".red().to_string(),
                OccurrenceStatus::Scheduled if occurrence.overridden => {
                    " (rescheduled)".yellow().to_string()
                }
                OccurrenceStatus::Scheduled => String::new(),
            };
            let time = occurrence
                .at_time
                .map(|t| format!(" {}", t.format("%H:%M")))
                .unwrap_or_default();
            println!("  {}. {}{}{}", i + 1, occurrence.date, time, marker);
        }
    }

    Ok(())
}

async fn preview_command(
    repo: &impl Repository,
    command: RecurPreviewCommand,
    config: &Config,
) -> Result<()> {
    let rule = resolve_rule(repo, &command.id).await?;
    let task = repo
        .find_task_by_id(rule.task_id)
        .await?
        .ok_or_else(|| anyhow!("Task not found"))?;

    let count = command.count.unwrap_or(config.preview_count);
    let today = today_in(&config.default_timezone)?;
    let occurrences = repo.preview_rule(rule.id, today, count).await?;

    if occurrences.is_empty() {
        println!("No upcoming occurrences (rule may have ended)");
        return Ok(());
    }

    println!(
        "{} (next {} occurrences)",
        "Preview".blue().bold(),
        occurrences.len()
    );
    println!("Task: {}", task.name.cyan());
    println!();

    for (i, occurrence) in occurrences.iter().enumerate() {
        let marker = match occurrence.status {
            OccurrenceStatus::Completed => " (completed)".green().to_string(),
            OccurrenceStatus::Cancelled => " (cancelled)".red().to_string(),
            OccurrenceStatus::Scheduled if occurrence.overridden => {
                " (rescheduled)".yellow().to_string()
            }
            OccurrenceStatus::Scheduled => String::new(),
        };
        let time = occurrence
            .at_time
            .map(|t| format!(" {}", t.format("%H:%M")))
            .unwrap_or_default();
        println!("  {}. {}{}{}", i + 1, occurrence.date, time, marker);
    }

    Ok(())
}

async fn reschedule_command(
    repo: &impl Repository,
    command: RecurRescheduleCommand,
) -> Result<()> {
    let rule = resolve_rule(repo, &command.id).await?;
    let date = parse_date(&command.on)?;
    let time = parse_time_string(&command.at)?;

    let applied = repo.reschedule_occurrence(rule.id, date, time).await?;

    println!(
        "{} Occurrence on {} moved to {}",
        "✓".green().bold(),
        applied.occurrence_date.to_string().cyan(),
        time.format("%H:%M").to_string().cyan()
    );

    Ok(())
}

async fn overrides_command(repo: &impl Repository, command: RecurOverridesCommand) -> Result<()> {
    let rule = resolve_rule(repo, &command.id).await?;
    let overrides = repo.find_overrides(rule.id).await?;

    if overrides.is_empty() {
        println!("No overrides found for this rule");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .set_header(vec!["Date", "Status", "Time", "Created"])
        .load_preset(comfy_table::presets::UTF8_FULL);

    for ov in overrides {
        table.add_row(vec![
            ov.occurrence_date.to_string(),
            ov.status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(template)".to_string()),
            ov.at_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "(template)".to_string()),
            ov.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }

    println!("{}", table);

    Ok(())
}

async fn remove_override_command(
    repo: &impl Repository,
    command: RecurRemoveOverrideCommand,
) -> Result<()> {
    let rule = resolve_rule(repo, &command.id).await?;
    let date = parse_date(&command.on)?;

    repo.remove_override(rule.id, date).await?;

    println!(
        "{} Occurrence on {} is back to the rule's defaults",
        "✓".green().bold(),
        date.to_string().cyan()
    );

    Ok(())
}

async fn end_command(repo: &impl Repository, command: RecurEndCommand) -> Result<()> {
    let rule = resolve_rule(repo, &command.id).await?;

    let anchor_end = if command.clear {
        Some(None)
    } else {
        match &command.until {
            Some(until) => Some(Some(parse_date(until)?)),
            None => return Err(anyhow!("Specify either --until <date> or --clear")),
        }
    };

    let updated = repo
        .update_rule(
            rule.id,
            UpdateRuleData {
                anchor_end,
                ..Default::default()
            },
        )
        .await?;

    match updated.anchor_end {
        Some(end) => println!("{} Rule now ends on {}", "✓".green().bold(), end),
        None => println!("{} Rule now runs forever", "✓".green().bold()),
    }

    Ok(())
}
