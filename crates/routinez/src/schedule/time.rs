//! Time-slot arithmetic for the weekly routine grid.
//!
//! The API hands back meeting times in two shapes, 24-hour `"13:50"` and
//! 12-hour `"1:50 PM"`. Everything here accepts both; comparisons happen
//! in minutes since midnight.

use chrono::NaiveTime;
use tracing::warn;

/// The seven fixed display slots of the weekly grid, 8:00 AM to 6:20 PM in
/// 80-minute blocks. The verbatim strings double as slot keys in request
/// payloads and grid lookups.
pub const TIME_SLOTS: [&str; 7] = [
    "8:00 AM-9:20 AM",
    "9:30 AM-10:50 AM",
    "11:00 AM-12:20 PM",
    "12:30 PM-1:50 PM",
    "2:00 PM-3:20 PM",
    "3:30 PM-4:50 PM",
    "5:00 PM-6:20 PM",
];

/// Converts a time string to minutes since midnight.
///
/// Malformed input resolves to 0 (the midnight bucket) rather than an
/// error; the legacy planner behaved this way and schedule rendering must
/// never fail on one bad entry. A warning is logged so the fallback is at
/// least observable.
pub fn time_to_minutes(tstr: &str) -> u32 {
    let tstr = tstr.trim();
    match parse_minutes(tstr) {
        Some(minutes) => minutes,
        None => {
            warn!(time = %tstr, "unparseable time string, defaulting to minute 0");
            0
        }
    }
}

fn parse_minutes(tstr: &str) -> Option<u32> {
    if tstr.contains("AM") || tstr.contains("PM") {
        let (time, period) = tstr.split_once(' ')?;
        let (hour, minute) = split_hour_minute(time)?;
        let hour = match (period.trim(), hour) {
            ("PM", 12) => 12,
            ("PM", h) => h + 12,
            ("AM", 12) => 0,
            ("AM", h) => h,
            _ => return None,
        };
        Some(hour * 60 + minute)
    } else if tstr.contains(':') {
        let (hour, minute) = split_hour_minute(tstr)?;
        Some(hour * 60 + minute)
    } else {
        None
    }
}

fn split_hour_minute(s: &str) -> Option<(u32, u32)> {
    let (hour, rest) = s.split_once(':')?;
    // Seconds ("08:00:00") are tolerated and ignored.
    let minute = rest.split(':').next().unwrap_or(rest);
    Some((hour.trim().parse().ok()?, minute.trim().parse().ok()?))
}

/// Half-open interval overlap in minutes. Touching boundaries
/// (`end1 == start2`) do not count as overlapping.
pub fn schedules_overlap(start1: u32, end1: u32, start2: u32, end2: u32) -> bool {
    start1.max(start2) < end1.min(end2)
}

/// Formats a time string (either wire shape) as `h:mm AM/PM`.
///
/// On parse failure the input is returned unchanged so a malformed entry
/// still renders something.
pub fn format_12_hour(tstr: &str) -> String {
    let trimmed = tstr.trim();
    let Some(total) = parse_minutes(trimmed) else {
        return trimmed.to_string();
    };
    match NaiveTime::from_hms_opt(total / 60, total % 60, 0) {
        Some(time) => time.format("%-I:%M %p").to_string(),
        None => trimmed.to_string(),
    }
}

/// Formats a start/end pair as `h:mm AM/PM - h:mm AM/PM`.
pub fn format_time_range(start: &str, end: &str) -> String {
    format!("{} - {}", format_12_hour(start), format_12_hour(end))
}

/// Start/end of a display slot in minutes since midnight.
pub fn slot_bounds(slot: &str) -> (u32, u32) {
    match slot.split_once('-') {
        Some((start, end)) => (time_to_minutes(start), time_to_minutes(end)),
        None => (0, 0),
    }
}
