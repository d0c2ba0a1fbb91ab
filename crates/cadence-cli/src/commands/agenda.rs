use anyhow::Result;
use cadence_core::repository::Repository;

use crate::cli::AgendaCommand;
use crate::config::Config;
use crate::parser::parse_date;
use crate::timezone::{normalize_timezone_input, today_in};
use crate::views::table::display_agenda;

pub async fn show_agenda(
    repo: &impl Repository,
    command: AgendaCommand,
    config: &Config,
) -> Result<()> {
    let timezone = match &command.timezone {
        Some(tz) => normalize_timezone_input(tz)?,
        None => config.default_timezone.clone(),
    };

    let date = match &command.date {
        Some(date) => parse_date(date)?,
        None => today_in(&timezone)?,
    };

    let entries = repo.agenda_for_date(date).await?;
    display_agenda(date, &entries);

    Ok(())
}
