//! Human-readable time formatting

use crate::laps::MAX_LAP_SECONDS;

/// `M:SS.sss` for a lap time in `(0, 600]`, `None` otherwise.
///
/// ```rust
/// use pitboard::timing::format_lap_time;
///
/// assert_eq!(format_lap_time(125.4321).as_deref(), Some("2:05.432"));
/// assert_eq!(format_lap_time(0.0), None);
/// ```
pub fn format_lap_time(seconds: f64) -> Option<String> {
    if !(seconds > 0.0 && seconds <= MAX_LAP_SECONDS) {
        return None;
    }

    let millis = (seconds * 1000.0).round() as u64;
    let (minutes, millis) = (millis / 60_000, millis % 60_000);
    Some(format!("{}:{:02}.{:03}", minutes, millis / 1000, millis % 1000))
}

/// `H:MM:SS` for a duration in seconds; `0:00:00` for anything non-positive.
pub fn format_duration(seconds: f64) -> String {
    if !(seconds > 0.0) {
        return "0:00:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Seconds with millisecond precision and an `s` suffix.
pub fn format_range(seconds: f64) -> String {
    format!("{:.3}s", seconds)
}
