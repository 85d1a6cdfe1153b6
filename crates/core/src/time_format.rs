//! Remaining-time rendering for player notifications.
//!
//! At most two units are shown, led by the largest non-zero one:
//! - days > 0: `"{d}d {h}h"`
//! - hours > 0: `"{h}h {m}m"`
//! - minutes > 0: `"{m}m {s}s"`
//! - otherwise: `"{s}s"`
//!
//! Sub-second remainders are truncated.

use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Format a remaining duration as its two largest units.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let days = total / SECS_PER_DAY;
    let hours = total % SECS_PER_DAY / SECS_PER_HOUR;
    let minutes = total % SECS_PER_HOUR / SECS_PER_MINUTE;
    let seconds = total % SECS_PER_MINUTE;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
