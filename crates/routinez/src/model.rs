//! Wire-format data model for the routine API.
//!
//! The API has gone through a couple of schema revisions and the client
//! still sees both shapes in the wild: seats arrive either as a
//! `consumedSeat` count or a precomputed `availableSeats`, and lab
//! schedules arrive either as a bare list (legacy) or wrapped in an object
//! with `classSchedules` (current). All of that is normalized here, once,
//! at ingestion.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sentinel for a missing faculty, room, or similar field.
pub const TBA: &str = "TBA";

/// A course as listed by `GET /courses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    #[serde(rename = "totalAvailableSeats", default)]
    pub total_available_seats: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A single class or lab meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSchedule {
    #[serde(default)]
    pub day: String,
    #[serde(rename = "startTime", default)]
    pub start_time: String,
    #[serde(rename = "endTime", default)]
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
}

/// Class meetings plus exam dates for a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionSchedule {
    #[serde(rename = "classSchedules", default)]
    pub class_schedules: Vec<ClassSchedule>,
    #[serde(rename = "midExamDate", default, skip_serializing_if = "Option::is_none")]
    pub mid_exam_date: Option<String>,
    #[serde(rename = "midExamStartTime", default, skip_serializing_if = "Option::is_none")]
    pub mid_exam_start_time: Option<String>,
    #[serde(rename = "midExamEndTime", default, skip_serializing_if = "Option::is_none")]
    pub mid_exam_end_time: Option<String>,
    #[serde(rename = "finalExamDate", default, skip_serializing_if = "Option::is_none")]
    pub final_exam_date: Option<String>,
    #[serde(rename = "finalExamStartTime", default, skip_serializing_if = "Option::is_none")]
    pub final_exam_start_time: Option<String>,
    #[serde(rename = "finalExamEndTime", default, skip_serializing_if = "Option::is_none")]
    pub final_exam_end_time: Option<String>,
}

/// The two lab-schedule wire shapes. Never match on this directly; use
/// [`Section::lab_schedule_entries`], which applies the room/faculty
/// fallbacks as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabSchedules {
    /// Current shape: `{ "classSchedules": [...] }`.
    Wrapped {
        #[serde(rename = "classSchedules", default)]
        class_schedules: Vec<ClassSchedule>,
    },
    /// Legacy shape: a plain list of meetings.
    Legacy(Vec<ClassSchedule>),
}

impl LabSchedules {
    fn entries(&self) -> &[ClassSchedule] {
        match self {
            LabSchedules::Wrapped { class_schedules } => class_schedules,
            LabSchedules::Legacy(schedules) => schedules,
        }
    }
}

/// A section as returned by `GET /course_details` and inside a generated
/// routine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "sectionId", default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<i64>,
    #[serde(rename = "sectionName", default)]
    pub section_name: String,
    #[serde(rename = "courseCode", default)]
    pub course_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculties: Option<String>,
    #[serde(default)]
    pub capacity: i64,
    #[serde(rename = "consumedSeat", default, skip_serializing_if = "Option::is_none")]
    pub consumed_seat: Option<i64>,
    #[serde(rename = "availableSeats", default, skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<i64>,
    #[serde(rename = "roomName", default, skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(rename = "labRoomName", default, skip_serializing_if = "Option::is_none")]
    pub lab_room_name: Option<String>,
    #[serde(rename = "labFaculties", default, skip_serializing_if = "Option::is_none")]
    pub lab_faculties: Option<String>,
    #[serde(rename = "sectionSchedule", default, skip_serializing_if = "Option::is_none")]
    pub section_schedule: Option<SectionSchedule>,
    #[serde(rename = "labSchedules", default, skip_serializing_if = "Option::is_none")]
    pub lab_schedules: Option<LabSchedules>,
    #[serde(rename = "prerequisiteCourses", default, skip_serializing_if = "Option::is_none")]
    pub prerequisite_courses: Option<String>,
}

impl Section {
    /// Seats still open in this section. Derivable from either wire shape;
    /// may be zero or negative (an overbooked section must still render).
    pub fn open_seats(&self) -> i64 {
        match self.available_seats {
            Some(available) => available,
            None => self.capacity - self.consumed_seat.unwrap_or(0),
        }
    }

    /// The faculty name used for grouping and display; empty or
    /// whitespace-only normalizes to [`TBA`].
    pub fn faculty_display(&self) -> &str {
        match &self.faculties {
            Some(name) if !name.trim().is_empty() => name,
            _ => TBA,
        }
    }

    /// Class meetings, or an empty slice when the schedule is absent.
    pub fn class_schedules(&self) -> &[ClassSchedule] {
        self.section_schedule
            .as_ref()
            .map(|s| s.class_schedules.as_slice())
            .unwrap_or(&[])
    }

    /// Lab meetings normalized from either wire shape, with `room`
    /// defaulted (section lab room, then the entry's own room, then TBA)
    /// and `faculty` defaulted (the entry's own, then the section's lab
    /// faculty, then TBA).
    pub fn lab_schedule_entries(&self) -> Vec<ClassSchedule> {
        let Some(labs) = &self.lab_schedules else {
            return Vec::new();
        };
        labs.entries()
            .iter()
            .map(|sched| {
                let room = self
                    .lab_room_name
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .or_else(|| sched.room.clone())
                    .unwrap_or_else(|| TBA.to_string());
                let faculty = sched
                    .faculty
                    .clone()
                    .filter(|f| !f.trim().is_empty())
                    .or_else(|| self.lab_faculties.clone())
                    .unwrap_or_else(|| TBA.to_string());
                ClassSchedule {
                    room: Some(room),
                    faculty: Some(faculty),
                    ..sched.clone()
                }
            })
            .collect()
    }

    /// Prerequisite course codes, with the "no prerequisite" sentinels
    /// (`null`, `"N/A"`, `"null"`) collapsing to an empty list.
    pub fn prerequisite_list(&self) -> Vec<String> {
        let Some(raw) = &self.prerequisite_courses else {
            return Vec::new();
        };
        let raw = raw.trim();
        if raw.is_empty() || raw == "N/A" || raw == "null" {
            return Vec::new();
        }
        raw.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Numeric-aware, case-insensitive ordering for section names such as
/// "2", "10", "07A". Digit runs compare as numbers, everything else as
/// lowercased text, so "2" sorts before "10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(lc), Some(rc)) => {
                if lc.is_ascii_digit() && rc.is_ascii_digit() {
                    let lnum = take_number(&mut left);
                    let rnum = take_number(&mut right);
                    match lnum.cmp(&rnum) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                let lc = lc.to_ascii_lowercase();
                let rc = rc.to_ascii_lowercase();
                if lc != rc {
                    return lc.cmp(&rc);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut value: u64 = 0;
    while let Some(c) = chars.peek() {
        let Some(digit) = c.to_digit(10) else { break };
        value = value.saturating_mul(10).saturating_add(u64::from(digit));
        chars.next();
    }
    value
}

/// Sorts sections by name for seat-status listings.
pub fn sort_sections_by_name(sections: &mut [Section]) {
    sections.sort_by(|a, b| natural_cmp(&a.section_name, &b.section_name));
}
