use anyhow::Result;
use cadence_core::timezone::{local_date_in, validate_timezone};
use chrono::{NaiveDate, Utc};

/// Today's calendar day in the given timezone.
pub fn today_in(timezone: &str) -> Result<NaiveDate> {
    Ok(local_date_in(timezone, Utc::now())?)
}

/// Validates user timezone input and returns it in canonical form.
pub fn normalize_timezone_input(timezone: &str) -> Result<String> {
    let tz = validate_timezone(timezone.trim())?;
    Ok(tz.name().to_string())
}

/// Detects the system timezone, falling back to UTC if detection fails.
pub fn detect_system_timezone() -> String {
    // Method 1: Check TZ environment variable
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    // Method 2: Try to read from /etc/timezone (Linux)
    #[cfg(target_os = "linux")]
    {
        if let Ok(tz) = std::fs::read_to_string("/etc/timezone") {
            let tz = tz.trim();
            if validate_timezone(tz).is_ok() {
                return tz.to_string();
            }
        }
    }

    // Method 3: chrono-independent system lookup
    if let Ok(local_tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&local_tz).is_ok() {
            return local_tz;
        }
    }

    // Fallback to UTC
    "UTC".to_string()
}
