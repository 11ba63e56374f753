//! Weekly routine grid assembly.
//!
//! Projects a flat list of sections onto a day × time-slot matrix. A
//! meeting lands in every fixed slot its time range overlaps, so a
//! three-hour lab legitimately shows up in two or three cells.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::model::{ClassSchedule, Section, TBA};
use crate::schedule::day::Day;
use crate::schedule::time::{
    format_time_range, schedules_overlap, slot_bounds, time_to_minutes, TIME_SLOTS,
};

/// Whether a grid entry is a class meeting or a lab meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Class,
    Lab,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Class => "Class",
            EntryKind::Lab => "Lab",
        }
    }
}

/// One displayable meeting inside a grid cell.
#[derive(Debug, Clone)]
pub struct GridEntry {
    pub kind: EntryKind,
    pub course_code: String,
    pub section_name: String,
    pub formatted_time: String,
    /// Raw room string; may still be a `;`-joined per-day list. Resolved
    /// for display via [`resolve_room_for_day`].
    pub room: String,
    pub faculty: String,
    pub day: Day,
}

impl GridEntry {
    /// The room to display for this entry's day.
    pub fn display_room(&self) -> String {
        resolve_room_for_day(&self.room, self.day)
    }
}

/// The assembled day × slot matrix. Buckets exist for all 7 days and all
/// 7 slots; day filtering happened at insertion, so unselected days are
/// simply empty.
#[derive(Debug, Clone)]
pub struct RoutineGrid {
    cells: Vec<Vec<Vec<GridEntry>>>,
    selected_days: BTreeSet<Day>,
}

impl RoutineGrid {
    /// Builds the grid for `sections`, keeping only meetings that fall on
    /// one of `selected_days`. Day names on the wire are matched
    /// case-insensitively; unknown day strings are skipped.
    pub fn assemble(sections: &[Section], selected_days: &BTreeSet<Day>) -> Self {
        let mut grid = Self {
            cells: (0..Day::ALL.len())
                .map(|_| vec![Vec::new(); TIME_SLOTS.len()])
                .collect(),
            selected_days: selected_days.clone(),
        };

        for section in sections {
            for sched in section.class_schedules() {
                grid.place(section, sched, EntryKind::Class);
            }
            for sched in &section.lab_schedule_entries() {
                grid.place(section, sched, EntryKind::Lab);
            }
        }

        grid
    }

    fn place(&mut self, section: &Section, sched: &ClassSchedule, kind: EntryKind) {
        let Ok(day) = sched.day.parse::<Day>() else {
            return;
        };
        if !self.selected_days.contains(&day) {
            return;
        }

        let start = time_to_minutes(&sched.start_time);
        let end = time_to_minutes(&sched.end_time);
        let formatted_time = format_time_range(&sched.start_time, &sched.end_time);

        let room = match kind {
            // Class meetings prefer the meeting's own room
            EntryKind::Class => sched
                .room
                .clone()
                .filter(|r| !r.trim().is_empty())
                .or_else(|| section.room_name.clone())
                .unwrap_or_else(|| TBA.to_string()),
            // Lab entries were already normalized
            EntryKind::Lab => sched.room.clone().unwrap_or_else(|| TBA.to_string()),
        };
        let faculty = match kind {
            EntryKind::Class => section.faculty_display().to_string(),
            EntryKind::Lab => sched.faculty.clone().unwrap_or_else(|| TBA.to_string()),
        };

        for (slot_idx, slot) in TIME_SLOTS.iter().enumerate() {
            let (slot_start, slot_end) = slot_bounds(slot);
            if schedules_overlap(start, end, slot_start, slot_end) {
                self.cells[day as usize][slot_idx].push(GridEntry {
                    kind,
                    course_code: section.course_code.clone(),
                    section_name: section.section_name.clone(),
                    formatted_time: formatted_time.clone(),
                    room: room.clone(),
                    faculty: faculty.clone(),
                    day,
                });
            }
        }
    }

    /// Entries for one cell, keyed by the slot's verbatim value string.
    pub fn entries(&self, day: Day, slot: &str) -> &[GridEntry] {
        match TIME_SLOTS.iter().position(|s| *s == slot) {
            Some(slot_idx) => &self.cells[day as usize][slot_idx],
            None => &[],
        }
    }

    /// The selected days in canonical week order (input order is
    /// irrelevant; columns always render Sunday-first).
    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.selected_days.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|cell| cell.is_empty())
    }

    /// Renders the grid as a plain-text weekly table: one row per fixed
    /// slot, one column per selected day.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        write!(out, "{:<19}", "Time/Day").unwrap();
        for day in self.days() {
            write!(out, " | {}", day.abbrev()).unwrap();
        }
        out.push('\n');

        for slot in TIME_SLOTS {
            write!(out, "{slot:<19}").unwrap();
            for day in self.days() {
                let cell = self
                    .entries(day, slot)
                    .iter()
                    .map(|entry| {
                        format!(
                            "{} {} [{}] {} @ {}",
                            entry.kind.label(),
                            entry.course_code,
                            entry.section_name,
                            entry.faculty,
                            entry.display_room(),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(out, " | {cell}").unwrap();
            }
            out.push('\n');
        }
        out
    }
}

/// Resolves a room string for a given day.
///
/// A plain room string is used verbatim. A `;`-joined list of
/// `DAY: ROOM` fragments is searched for the fragment mentioning `day`
/// (case-insensitive), and the text after the last `:` is returned. No
/// match falls back to TBA.
pub fn resolve_room_for_day(room: &str, day: Day) -> String {
    if !room.contains(';') {
        return room.to_string();
    }
    let day_upper = day.upper();
    for part in room.split(';') {
        let part = part.trim();
        if part.to_uppercase().contains(day_upper) {
            return part.rsplit(':').next().unwrap_or(part).trim().to_string();
        }
    }
    TBA.to_string()
}

/// Distinct days on which any class or lab of `sections` meets, in
/// canonical week order.
pub fn campus_days(sections: &[Section]) -> Vec<Day> {
    let mut days = BTreeSet::new();
    for section in sections {
        for sched in section.class_schedules() {
            if let Ok(day) = sched.day.parse::<Day>() {
                days.insert(day);
            }
        }
        for sched in section.lab_schedule_entries() {
            if let Ok(day) = sched.day.parse::<Day>() {
                days.insert(day);
            }
        }
    }
    days.into_iter().collect()
}
