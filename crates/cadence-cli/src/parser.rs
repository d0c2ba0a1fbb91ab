use anyhow::Result;
use cadence_core::models::WeekdaySet;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_english::{parse_date_string, Dialect};

/// Parse a due date/time, accepting natural language ("tomorrow", "friday").
pub fn parse_due_date(date_str: &str) -> Result<DateTime<Utc>> {
    parse_date_string(date_str, Utc::now(), Dialect::Us)
        .map_err(|e| anyhow::anyhow!("Failed to parse due date '{}': {}", date_str, e))
}

/// Parse a plain calendar date. ISO dates are taken literally; anything else
/// goes through the natural-language parser and keeps only the day.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") {
        return Ok(date);
    }
    Ok(parse_due_date(date_str)?.date_naive())
}

/// Parse time string like "9:00 AM", "14:30", "9pm", "noon", "midnight"
pub fn parse_time_string(time_str: &str) -> Result<NaiveTime> {
    let input = time_str.trim().to_lowercase();

    // Handle special times first
    match input.as_str() {
        "noon" | "12pm" | "12:00pm" => return Ok(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
        "midnight" | "12am" | "12:00am" => return Ok(NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
        _ => {}
    }

    let formats = [
        "%H:%M:%S",    // 14:30:00
        "%H:%M",       // 14:30
        "%I:%M:%S %p", // 9:00:00 AM
        "%I:%M %p",    // 9:00 AM
        "%I%p",        // 9AM, 9PM
        "%I %p",       // 9 AM, 9 PM
    ];

    for format in &formats {
        if let Ok(time) = NaiveTime::parse_from_str(time_str.trim(), format) {
            return Ok(time);
        }
    }
    for format in &formats {
        if let Ok(time) = NaiveTime::parse_from_str(&input, format) {
            return Ok(time);
        }
    }

    Err(anyhow::anyhow!(
        "Invalid time format: '{}'\n\nSupported formats:\n  • 24-hour: '14:30', '09:00'\n  • 12-hour: '2:30 PM', '9:00 AM'\n  • Compact: '2pm', '9am'\n  • Special: 'noon', 'midnight'",
        time_str
    ))
}

/// Parse days string like "mon,tue,wed", "monday,tuesday", or "weekdays"
pub fn parse_days_string(days_str: &str) -> Result<WeekdaySet> {
    let input = days_str.trim().to_lowercase();

    // Handle special day groups
    let set = match input.as_str() {
        "weekdays" | "workdays" => WeekdaySet::weekdays(),
        "weekends" => WeekdaySet::weekend(),
        _ => input.parse::<WeekdaySet>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid day(s): '{}'\n\nSupported formats:\n  • Full names: 'monday,tuesday'\n  • Short names: 'mon,tue,wed'\n  • Groups: 'weekdays', 'weekends'",
                days_str
            )
        })?,
    };

    if set.is_empty() {
        return Err(anyhow::anyhow!(
            "No valid days specified in: '{}'\n\nExamples:\n  • mon,wed,fri\n  • weekdays",
            days_str
        ));
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use rstest::rstest;

    #[test]
    fn test_parse_date_iso() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2025-02-30").is_err());
    }

    #[rstest]
    #[case("14:30", 14, 30)]
    #[case("9:00 AM", 9, 0)]
    #[case("2:30 PM", 14, 30)]
    #[case("9pm", 21, 0)]
    #[case("noon", 12, 0)]
    #[case("midnight", 0, 0)]
    fn test_parse_time_string(#[case] input: &str, #[case] hour: u32, #[case] minute: u32) {
        assert_eq!(
            parse_time_string(input).unwrap(),
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_time_string_rejects_garbage() {
        assert!(parse_time_string("sometime soon").is_err());
    }

    #[test]
    fn test_parse_days_string() {
        let set = parse_days_string("mon,wed,fri").unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(Weekday::Wed));

        assert_eq!(parse_days_string("weekdays").unwrap().len(), 5);
        assert_eq!(parse_days_string("weekends").unwrap().len(), 2);
        assert!(parse_days_string("mon,funday").is_err());
        assert!(parse_days_string("").is_err());
    }
}
