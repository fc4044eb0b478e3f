//! Relative time labels for report cards.

use chrono::{DateTime, Utc};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Label shown when a report carries no timestamp.
pub const UNKNOWN_TIME: &str = "Unknown time";

/// Format `timestamp` relative to `now`.
///
/// Durations under an hour render in minutes, under a day in hours and
/// anything longer in days, each floored. Timestamps ahead of `now` clamp to
/// zero minutes.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use safezone_core::time::format_relative_time;
///
/// let now = Utc::now();
/// assert_eq!(format_relative_time(now, Some(now - Duration::minutes(45))), "45 mins ago");
/// assert_eq!(format_relative_time(now, None), "Unknown time");
/// ```
pub fn format_relative_time(now: DateTime<Utc>, timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return UNKNOWN_TIME.to_string();
    };

    let minutes = now.signed_duration_since(timestamp).num_minutes().max(0);
    if minutes < MINUTES_PER_HOUR {
        format!("{minutes} mins ago")
    } else if minutes < MINUTES_PER_DAY {
        format!("{} hours ago", minutes / MINUTES_PER_HOUR)
    } else {
        format!("{} days ago", minutes / MINUTES_PER_DAY)
    }
}
