use chrono::{DateTime, Local, Utc};
use std::time::Duration;

/// Formats bytes into human-readable size
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{bytes} {}", UNITS[unit_index])
    } else {
        format!("{size:.2} {}", UNITS[unit_index])
    }
}

/// Formats a UTC timestamp in local time, second precision.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Formats a timestamp as the short `[HH:MM:SS]` clock used in watch output.
#[must_use]
pub fn format_clock(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Formats how long ago something happened:
/// whole seconds and minutes, fractional hours and days.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs_f64();

    if secs < 60.0 {
        format!("{} seconds", age.as_secs())
    } else if secs < 3600.0 {
        format!("{} minutes", age.as_secs() / 60)
    } else if secs < 86_400.0 {
        format!("{:.1} hours", secs / 3600.0)
    } else {
        format!("{:.1} days", secs / 86_400.0)
    }
}

/// Truncates a string to at most `max` characters (not bytes).
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
