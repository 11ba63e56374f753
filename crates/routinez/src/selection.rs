//! Cascading course → faculty → section selection state.
//!
//! The planner holds everything the user has picked so far and enforces
//! the ordering rules between the levels: a section can only be chosen
//! under a selected faculty, removing a faculty drops its section,
//! locking a course narrows it to a single faculty, and so on. The final
//! [`RoutinePlanner::build_request`] step validates preferences and
//! serializes the whole selection into the generate-endpoint payload.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::model::{natural_cmp, Section};
use crate::schedule::{Day, TIME_SLOTS};

/// How far the student lives from campus; steers the AI scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommutePreference {
    Far,
    Near,
}

impl CommutePreference {
    pub fn wire(self) -> &'static str {
        match self {
            CommutePreference::Far => "far",
            CommutePreference::Near => "near",
        }
    }
}

/// Sections of one course taught by one faculty, with seat totals for
/// the dropdown label.
#[derive(Debug, Clone, Default)]
pub struct FacultyGroup {
    pub sections: Vec<Section>,
    pub total_seats: i64,
    pub available_seats: i64,
}

/// Groups sections by faculty (blank faculty lands under TBA), sorted by
/// faculty name. Unless the course is locked, sections with no open seat
/// are dropped entirely so full sections never reach the dropdowns.
pub fn group_by_faculty(sections: &[Section], locked: bool) -> BTreeMap<String, FacultyGroup> {
    let mut groups: BTreeMap<String, FacultyGroup> = BTreeMap::new();
    for section in sections {
        let open = section.open_seats();
        if !locked && open < 1 {
            continue;
        }
        let group = groups
            .entry(section.faculty_display().to_string())
            .or_default();
        group.sections.push(section.clone());
        group.total_seats += section.capacity;
        group.available_seats += open;
    }
    for group in groups.values_mut() {
        group
            .sections
            .sort_by(|a, b| natural_cmp(&a.section_name, &b.section_name));
    }
    groups
}

/// A course add that is waiting on prerequisite confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCourse {
    pub course: String,
    pub missing: Vec<String>,
    pub details: Vec<Section>,
}

/// Result of [`RoutinePlanner::add_course`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddCourse {
    Added,
    AlreadySelected,
    /// The add is parked until the user confirms or declines.
    PrerequisitesMissing(PendingCourse),
}

/// Why a request could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least two days. Classes typically require two days per week.")]
    TooFewDays,
    #[error("Please select a commute preference (Live Far or Live Near) when using AI.")]
    MissingCommutePreference,
}

/// One course's slice of the generate payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSelection {
    pub course: String,
    pub sections: Map<String, Value>,
}

/// The generate-endpoint request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineRequest {
    pub courses: Vec<CourseSelection>,
    pub days: Vec<String>,
    pub times: Vec<String>,
    #[serde(rename = "useAI")]
    pub use_ai: bool,
    #[serde(rename = "commutePreference")]
    pub commute_preference: String,
}

/// The whole selection state: courses in pick order, per-course faculty
/// groupings and picks, locks, and day/time preferences.
#[derive(Debug, Default)]
pub struct RoutinePlanner {
    courses: Vec<String>,
    faculty_by_course: HashMap<String, BTreeMap<String, FacultyGroup>>,
    selected_faculty: HashMap<String, Vec<String>>,
    selected_sections: HashMap<String, HashMap<String, Section>>,
    locked: HashSet<String>,
    days: BTreeSet<Day>,
    times: Vec<String>,
    commute: Option<CommutePreference>,
    pending: Option<PendingCourse>,
}

impl RoutinePlanner {
    /// A fresh planner with all days and all time slots preselected.
    pub fn new() -> Self {
        Self {
            days: Day::ALL.into_iter().collect(),
            times: TIME_SLOTS.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    pub fn is_locked(&self, course: &str) -> bool {
        self.locked.contains(course)
    }

    pub fn selected_days(&self) -> &BTreeSet<Day> {
        &self.days
    }

    pub fn selected_times(&self) -> &[String] {
        &self.times
    }

    pub fn commute(&self) -> Option<CommutePreference> {
        self.commute
    }

    pub fn set_commute(&mut self, preference: Option<CommutePreference>) {
        self.commute = preference;
    }

    pub fn pending(&self) -> Option<&PendingCourse> {
        self.pending.as_ref()
    }

    /// Faculty groups for one course, as last ingested.
    pub fn faculty_groups(&self, course: &str) -> Option<&BTreeMap<String, FacultyGroup>> {
        self.faculty_by_course.get(course)
    }

    pub fn selected_faculties(&self, course: &str) -> &[String] {
        self.selected_faculty
            .get(course)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selected_section(&self, course: &str, faculty: &str) -> Option<&Section> {
        self.selected_sections.get(course)?.get(faculty)
    }

    /// Whether a course may be offered in the picker. A locked or
    /// already-listed course is always selectable; otherwise at least one
    /// seat must be open unless every section is being shown.
    pub fn course_selectable(&self, total_available_seats: i64, show_all: bool, locked: bool) -> bool {
        show_all || locked || total_available_seats >= 1
    }

    /// Adds a course, gating on prerequisites. `details` are the course's
    /// sections; prerequisites are read off the first one.
    pub fn add_course(&mut self, course: &str, details: Vec<Section>) -> AddCourse {
        if self.courses.iter().any(|c| c == course) {
            return AddCourse::AlreadySelected;
        }

        let missing: Vec<String> = details
            .first()
            .map(|s| s.prerequisite_list())
            .unwrap_or_default()
            .into_iter()
            .filter(|pre| !self.courses.iter().any(|c| c == pre))
            .collect();

        if !missing.is_empty() {
            let pending = PendingCourse {
                course: course.to_string(),
                missing,
                details,
            };
            self.pending = Some(pending.clone());
            return AddCourse::PrerequisitesMissing(pending);
        }

        self.insert_course(course, details);
        AddCourse::Added
    }

    /// Confirms the pending prerequisite-gated add, if any.
    pub fn confirm_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(course = %pending.course, "prerequisite gate overridden");
            self.insert_course(&pending.course.clone(), pending.details);
        }
    }

    pub fn decline_pending(&mut self) {
        self.pending = None;
    }

    fn insert_course(&mut self, course: &str, details: Vec<Section>) {
        self.courses.push(course.to_string());
        let locked = self.locked.contains(course);
        self.faculty_by_course
            .insert(course.to_string(), group_by_faculty(&details, locked));
    }

    /// Removes a course and every downstream pick hanging off it.
    pub fn remove_course(&mut self, course: &str) {
        self.courses.retain(|c| c != course);
        self.faculty_by_course.remove(course);
        self.selected_faculty.remove(course);
        self.selected_sections.remove(course);
        self.locked.remove(course);
    }

    /// Replaces a course's section data after a refetch (seat updates, or
    /// a lock toggle changing the seat filter). Selected faculties and
    /// sections that no longer exist in the new data are dropped.
    pub fn update_course_sections(&mut self, course: &str, details: Vec<Section>) {
        if !self.courses.iter().any(|c| c == course) {
            return;
        }
        let locked = self.locked.contains(course);
        let groups = group_by_faculty(&details, locked);

        if let Some(faculties) = self.selected_faculty.get_mut(course) {
            faculties.retain(|f| groups.contains_key(f));
        }
        if let Some(sections) = self.selected_sections.get_mut(course) {
            sections.retain(|faculty, section| {
                groups.get(faculty).is_some_and(|g| {
                    g.sections.iter().any(|s| s.section_name == section.section_name)
                })
            });
        }
        self.faculty_by_course.insert(course.to_string(), groups);
    }

    /// Toggles the lock on a course. Locking narrows the selection to the
    /// first chosen faculty and drops the rest. The caller is expected to
    /// refetch the course's sections afterwards, since the lock changes
    /// which sections pass the seat filter, and push the result through
    /// [`Self::update_course_sections`].
    pub fn toggle_lock(&mut self, course: &str) -> bool {
        if self.locked.remove(course) {
            return false;
        }
        self.locked.insert(course.to_string());

        if let Some(faculties) = self.selected_faculty.get_mut(course) {
            faculties.truncate(1);
            let keep = faculties.first().cloned();
            if let Some(sections) = self.selected_sections.get_mut(course) {
                sections.retain(|faculty, _| Some(faculty) == keep.as_ref());
            }
        }
        true
    }

    /// Selects a faculty for a course. Locked courses replace their single
    /// faculty; unlocked courses accumulate. Sections under deselected
    /// faculties are dropped.
    pub fn select_faculty(&mut self, course: &str, faculty: &str) {
        let entry = self.selected_faculty.entry(course.to_string()).or_default();
        if self.locked.contains(course) {
            entry.clear();
            entry.push(faculty.to_string());
        } else if !entry.iter().any(|f| f == faculty) {
            entry.push(faculty.to_string());
        }

        let keep: HashSet<String> = entry.iter().cloned().collect();
        if let Some(sections) = self.selected_sections.get_mut(course) {
            sections.retain(|f, _| keep.contains(f));
        }
    }

    /// Deselects a faculty, dropping its section pick with it.
    pub fn remove_faculty(&mut self, course: &str, faculty: &str) {
        if let Some(faculties) = self.selected_faculty.get_mut(course) {
            faculties.retain(|f| f != faculty);
        }
        if let Some(sections) = self.selected_sections.get_mut(course) {
            sections.remove(faculty);
        }
    }

    /// Picks a specific section under a selected faculty. The section must
    /// exist in that faculty's current group; a stale name is ignored.
    pub fn select_section(&mut self, course: &str, faculty: &str, section_name: &str) {
        if !self.selected_faculties(course).iter().any(|f| f == faculty) {
            return;
        }
        let Some(section) = self
            .faculty_by_course
            .get(course)
            .and_then(|groups| groups.get(faculty))
            .and_then(|group| {
                group
                    .sections
                    .iter()
                    .find(|s| s.section_name == section_name)
            })
            .cloned()
        else {
            return;
        };
        self.selected_sections
            .entry(course.to_string())
            .or_default()
            .insert(faculty.to_string(), section);
    }

    /// Whether a locked course has its mandatory faculty + section pair.
    /// Unlocked courses are always complete; the generator is free to pick
    /// among whatever was narrowed down.
    pub fn is_course_complete(&self, course: &str) -> bool {
        if !self.locked.contains(course) {
            return true;
        }
        let faculties = self.selected_faculties(course);
        faculties.len() == 1
            && self
                .selected_section(course, &faculties[0])
                .is_some()
    }

    pub fn add_day(&mut self, day: Day) {
        self.days.insert(day);
    }

    pub fn remove_day(&mut self, day: Day) {
        self.days.remove(&day);
    }

    /// Adds a time slot, keeping the canonical slot order.
    pub fn add_time(&mut self, slot: &str) {
        if self.times.iter().any(|t| t == slot) {
            return;
        }
        if TIME_SLOTS.contains(&slot) {
            self.times.push(slot.to_string());
            self.times.sort_by_key(|t| {
                TIME_SLOTS.iter().position(|s| s == t).unwrap_or(usize::MAX)
            });
        }
    }

    pub fn remove_time(&mut self, slot: &str) {
        self.times.retain(|t| t != slot);
    }

    /// Validates preferences and serializes the selection into the
    /// generate payload. Day names go out uppercase; time slots go out as
    /// their verbatim slot strings.
    pub fn build_request(&self, use_ai: bool) -> Result<RoutineRequest, ValidationError> {
        if self.days.len() < 2 {
            return Err(ValidationError::TooFewDays);
        }
        if use_ai && self.commute.is_none() {
            return Err(ValidationError::MissingCommutePreference);
        }

        let courses = self
            .courses
            .iter()
            .map(|course| CourseSelection {
                course: course.clone(),
                sections: self.sections_payload(course),
            })
            .collect();

        Ok(RoutineRequest {
            courses,
            days: self.days.iter().map(|d| d.upper().to_string()).collect(),
            times: self.times.clone(),
            use_ai,
            commute_preference: self
                .commute
                .map(|c| c.wire().to_string())
                .unwrap_or_default(),
        })
    }

    // Per faculty: a chosen section serializes as a value/label pair plus
    // the full section object; a faculty with no section pick serializes
    // as an empty object so the server knows the faculty constraint alone.
    fn sections_payload(&self, course: &str) -> Map<String, Value> {
        let mut map = Map::new();
        for faculty in self.selected_faculties(course) {
            let value = match self.selected_section(course, faculty) {
                Some(section) => json!({
                    "value": section.section_name,
                    "label": section.section_name,
                    "section": section,
                }),
                None => json!({}),
            };
            map.insert(faculty.clone(), value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(value: serde_json::Value) -> Section {
        serde_json::from_value(value).unwrap()
    }

    fn cse110_sections() -> Vec<Section> {
        vec![
            section(json!({
                "sectionName": "01", "courseCode": "CSE110", "faculties": "MMH",
                "capacity": 30, "consumedSeat": 30
            })),
            section(json!({
                "sectionName": "02", "courseCode": "CSE110", "faculties": "MMH",
                "capacity": 30, "consumedSeat": 10
            })),
            section(json!({
                "sectionName": "10", "courseCode": "CSE110", "faculties": "ABC",
                "capacity": 35, "availableSeats": 5
            })),
        ]
    }

    #[test]
    fn test_group_by_faculty_filters_full_sections() {
        let groups = group_by_faculty(&cse110_sections(), false);
        // Section 01 is full and dropped
        assert_eq!(groups["MMH"].sections.len(), 1);
        assert_eq!(groups["MMH"].sections[0].section_name, "02");
        assert_eq!(groups["MMH"].available_seats, 20);
        assert_eq!(groups["ABC"].available_seats, 5);
    }

    #[test]
    fn test_group_by_faculty_locked_keeps_full_sections() {
        let groups = group_by_faculty(&cse110_sections(), true);
        assert_eq!(groups["MMH"].sections.len(), 2);
        assert_eq!(groups["MMH"].total_seats, 60);
        assert_eq!(groups["MMH"].available_seats, 20);
    }

    #[test]
    fn test_group_by_faculty_sorts_sections_naturally() {
        let sections = vec![
            section(json!({ "sectionName": "10", "faculties": "X", "capacity": 1 })),
            section(json!({ "sectionName": "2", "faculties": "X", "capacity": 1 })),
        ];
        let groups = group_by_faculty(&sections, false);
        let names: Vec<&str> = groups["X"].sections.iter().map(|s| s.section_name.as_str()).collect();
        assert_eq!(names, vec!["2", "10"]);
    }

    #[test]
    fn test_add_course_and_duplicate() {
        let mut planner = RoutinePlanner::new();
        assert_eq!(planner.add_course("CSE110", cse110_sections()), AddCourse::Added);
        assert_eq!(
            planner.add_course("CSE110", cse110_sections()),
            AddCourse::AlreadySelected
        );
        assert_eq!(planner.courses(), &["CSE110".to_string()]);
    }

    #[test]
    fn test_prerequisite_gate() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());

        let cse220 = vec![section(json!({
            "sectionName": "01", "courseCode": "CSE220", "capacity": 30,
            "prerequisiteCourses": "CSE110, CSE111"
        }))];
        match planner.add_course("CSE220", cse220.clone()) {
            AddCourse::PrerequisitesMissing(pending) => {
                assert_eq!(pending.missing, vec!["CSE111"]);
            }
            other => panic!("expected prerequisite gate, got {other:?}"),
        }
        // Not added yet; confirm pushes it through
        assert_eq!(planner.courses().len(), 1);
        planner.confirm_pending();
        assert_eq!(planner.courses(), &["CSE110".to_string(), "CSE220".to_string()]);
        assert!(planner.pending().is_none());
    }

    #[test]
    fn test_decline_pending_drops_the_add() {
        let mut planner = RoutinePlanner::new();
        let gated = vec![section(json!({
            "sectionName": "01", "capacity": 5, "prerequisiteCourses": "MAT110"
        }))];
        planner.add_course("MAT215", gated);
        planner.decline_pending();
        assert!(planner.courses().is_empty());
        assert!(planner.pending().is_none());
    }

    #[test]
    fn test_faculty_and_section_cascade() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        planner.select_faculty("CSE110", "MMH");
        planner.select_faculty("CSE110", "ABC");
        assert_eq!(planner.selected_faculties("CSE110"), &["MMH", "ABC"]);

        planner.select_section("CSE110", "MMH", "02");
        assert!(planner.selected_section("CSE110", "MMH").is_some());

        // Stale section names are ignored
        planner.select_section("CSE110", "ABC", "99");
        assert!(planner.selected_section("CSE110", "ABC").is_none());

        // Removing the faculty drops its section
        planner.remove_faculty("CSE110", "MMH");
        assert!(planner.selected_section("CSE110", "MMH").is_none());
        assert_eq!(planner.selected_faculties("CSE110"), &["ABC"]);
    }

    #[test]
    fn test_section_requires_selected_faculty() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        planner.select_section("CSE110", "MMH", "02");
        assert!(planner.selected_section("CSE110", "MMH").is_none());
    }

    #[test]
    fn test_lock_narrows_to_first_faculty() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        planner.select_faculty("CSE110", "MMH");
        planner.select_faculty("CSE110", "ABC");
        planner.select_section("CSE110", "MMH", "02");
        planner.select_section("CSE110", "ABC", "10");

        assert!(planner.toggle_lock("CSE110"));
        assert_eq!(planner.selected_faculties("CSE110"), &["MMH"]);
        assert!(planner.selected_section("CSE110", "MMH").is_some());
        assert!(planner.selected_section("CSE110", "ABC").is_none());

        // Locked courses replace rather than accumulate
        planner.select_faculty("CSE110", "ABC");
        assert_eq!(planner.selected_faculties("CSE110"), &["ABC"]);

        assert!(!planner.toggle_lock("CSE110"));
        assert!(!planner.is_locked("CSE110"));
    }

    #[test]
    fn test_locked_completeness() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        assert!(planner.is_course_complete("CSE110"));

        planner.toggle_lock("CSE110");
        planner.update_course_sections("CSE110", cse110_sections());
        assert!(!planner.is_course_complete("CSE110"));

        planner.select_faculty("CSE110", "MMH");
        assert!(!planner.is_course_complete("CSE110"));
        planner.select_section("CSE110", "MMH", "01");
        assert!(planner.is_course_complete("CSE110"));
    }

    #[test]
    fn test_update_sections_drops_vanished_picks() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        planner.select_faculty("CSE110", "ABC");
        planner.select_section("CSE110", "ABC", "10");

        // ABC's section fills up and disappears from the unlocked view
        planner.update_course_sections(
            "CSE110",
            vec![section(json!({
                "sectionName": "02", "faculties": "MMH", "capacity": 30, "consumedSeat": 10
            }))],
        );
        assert!(planner.selected_faculties("CSE110").is_empty());
        assert!(planner.selected_section("CSE110", "ABC").is_none());
    }

    #[test]
    fn test_remove_course_clears_everything() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        planner.select_faculty("CSE110", "MMH");
        planner.toggle_lock("CSE110");
        planner.remove_course("CSE110");
        assert!(planner.courses().is_empty());
        assert!(!planner.is_locked("CSE110"));
        assert!(planner.faculty_groups("CSE110").is_none());
    }

    #[test]
    fn test_course_selectable() {
        let planner = RoutinePlanner::new();
        assert!(planner.course_selectable(3, false, false));
        assert!(!planner.course_selectable(0, false, false));
        assert!(planner.course_selectable(0, true, false));
        assert!(planner.course_selectable(0, false, true));
    }

    #[test]
    fn test_build_request_requires_two_days() {
        let mut planner = RoutinePlanner::new();
        for day in Day::ALL {
            planner.remove_day(day);
        }
        planner.add_day(Day::Monday);
        assert_eq!(planner.build_request(false), Err(ValidationError::TooFewDays));

        planner.add_day(Day::Wednesday);
        assert!(planner.build_request(false).is_ok());
    }

    #[test]
    fn test_build_request_requires_commute_with_ai() {
        let mut planner = RoutinePlanner::new();
        assert_eq!(
            planner.build_request(true),
            Err(ValidationError::MissingCommutePreference)
        );
        planner.set_commute(Some(CommutePreference::Near));
        let request = planner.build_request(true).unwrap();
        assert!(request.use_ai);
        assert_eq!(request.commute_preference, "near");
    }

    #[test]
    fn test_request_payload_shape() {
        let mut planner = RoutinePlanner::new();
        planner.add_course("CSE110", cse110_sections());
        planner.select_faculty("CSE110", "MMH");
        planner.select_faculty("CSE110", "ABC");
        planner.select_section("CSE110", "MMH", "02");

        let request = planner.build_request(false).unwrap();
        assert_eq!(request.days.len(), 7);
        assert_eq!(request.days[0], "SUNDAY");
        assert_eq!(request.times, TIME_SLOTS.map(String::from).to_vec());
        assert_eq!(request.commute_preference, "");

        let body = serde_json::to_value(&request).unwrap();
        let sections = &body["courses"][0]["sections"];
        assert_eq!(sections["MMH"]["value"], "02");
        assert_eq!(sections["MMH"]["label"], "02");
        assert_eq!(sections["MMH"]["section"]["sectionName"], "02");
        // Faculty selected without a section pick serializes empty
        assert_eq!(sections["ABC"], json!({}));
    }

    #[test]
    fn test_time_slots_keep_canonical_order() {
        let mut planner = RoutinePlanner::new();
        planner.remove_time("8:00 AM-9:20 AM");
        planner.remove_time("11:00 AM-12:20 PM");
        planner.add_time("8:00 AM-9:20 AM");
        planner.add_time("not a slot");
        assert_eq!(planner.selected_times()[0], "8:00 AM-9:20 AM");
        assert_eq!(planner.selected_times().len(), TIME_SLOTS.len() - 1);
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::TooFewDays.to_string(),
            "Please select at least two days. Classes typically require two days per week."
        );
        assert_eq!(
            ValidationError::MissingCommutePreference.to_string(),
            "Please select a commute preference (Live Far or Live Near) when using AI."
        );
    }
}
