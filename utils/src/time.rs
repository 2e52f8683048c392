//! Countdown formatting for notifications and status output.

/// Format a duration in seconds as days, hours and minutes, e.g. `"1d 4h 30m"`.
///
/// Leading zero units are dropped; anything under a minute is `"0m"`.
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
