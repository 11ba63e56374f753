//! Schedule-grid assembly: days, time slots, and the weekly matrix.

mod day;
mod grid;
mod time;

pub use day::Day;
pub use grid::{campus_days, resolve_room_for_day, EntryKind, GridEntry, RoutineGrid};
pub use time::{
    format_12_hour, format_time_range, schedules_overlap, slot_bounds, time_to_minutes, TIME_SLOTS,
};
