use chrono::{DateTime, Local, NaiveDate, Utc};

/// Local-time display form, e.g. `2024/5/20 15:00:00`.
#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%Y/%-m/%-d %-H:%M:%S")
        .to_string()
}

/// Display form of a stored timestamp string.
///
/// Empty input gives empty output and anything unparsable is echoed back unchanged.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return format_datetime(parsed.with_timezone(&Utc));
    }
    // A bare date reads as midnight UTC.
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return format_datetime(midnight.and_utc());
    }
    raw.to_owned()
}
