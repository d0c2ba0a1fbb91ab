use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

use crate::error::CoreError;

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// The calendar day an instant falls on in the given timezone.
///
/// The occurrence resolver works purely on calendar days in the owning
/// user's timezone; this is where callers normalize "now" (or any other
/// instant) before querying it.
pub fn local_date_in(timezone: &str, at_time: DateTime<Utc>) -> Result<NaiveDate, CoreError> {
    let tz = validate_timezone(timezone)?;
    Ok(at_time.with_timezone(&tz).date_naive())
}

/// Format an instant for display in the given timezone.
pub fn format_with_timezone(
    datetime: DateTime<Utc>,
    timezone: &str,
    format: &str,
) -> Result<String, CoreError> {
    let tz = validate_timezone(timezone)?;
    Ok(datetime.with_timezone(&tz).format(format).to_string())
}
