//! Human-readable rendering helpers.
//!
//! History lines, notices, and CLI output all share these formatters so a
//! duration or timestamp reads the same everywhere it appears.

use chrono::{DateTime, Utc};

/// Formats an accumulated duration as `1h 2m 3s`, `2m 5s`, or `45s`.
///
/// Leading zero components are omitted, trailing ones are kept, so a
/// duration of exactly one hour renders as `1h 0m 0s`.
pub fn format_duration(seconds: u64) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Formats an event timestamp for history lines.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
