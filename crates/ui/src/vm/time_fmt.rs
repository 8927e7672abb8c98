/// Countdown label: `mm:ss` below an hour, `h:mm:ss` from one hour on.
#[must_use]
pub fn format_countdown(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Compact duration for per-question time, e.g. `45s` or `3m 05s`.
#[must_use]
pub fn format_time_spent(total_secs: u64) -> String {
    if total_secs < 60 {
        return format!("{total_secs}s");
    }
    format!("{}m {:02}s", total_secs / 60, total_secs % 60)
}
