//! Exam summary rows for a generated routine.

use crate::model::{Section, TBA};
use crate::schedule::format_time_range;

/// One row of the exam table: a section's midterm and final slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamEntry {
    pub course_code: String,
    pub section_name: String,
    pub mid_date: String,
    pub mid_time: String,
    pub final_date: String,
    pub final_time: String,
}

impl ExamEntry {
    /// Builds one row per section, in routine order. Sections without a
    /// schedule still get a row of TBA cells so the table stays aligned
    /// with the routine.
    pub fn collect(sections: &[Section]) -> Vec<ExamEntry> {
        sections
            .iter()
            .map(|section| {
                let sched = section.section_schedule.as_ref();
                ExamEntry {
                    course_code: section.course_code.clone(),
                    section_name: section.section_name.clone(),
                    mid_date: date_or_tba(sched.and_then(|s| s.mid_exam_date.as_deref())),
                    mid_time: exam_time(
                        sched.and_then(|s| s.mid_exam_start_time.as_deref()),
                        sched.and_then(|s| s.mid_exam_end_time.as_deref()),
                    ),
                    final_date: date_or_tba(sched.and_then(|s| s.final_exam_date.as_deref())),
                    final_time: exam_time(
                        sched.and_then(|s| s.final_exam_start_time.as_deref()),
                        sched.and_then(|s| s.final_exam_end_time.as_deref()),
                    ),
                }
            })
            .collect()
    }
}

fn date_or_tba(date: Option<&str>) -> String {
    match date {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => TBA.to_string(),
    }
}

// A time range renders only when both endpoints are present; a lone
// start or end time is as good as none.
fn exam_time(start: Option<&str>, end: Option<&str>) -> String {
    match (start, end) {
        (Some(start), Some(end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
            format_time_range(start, end)
        }
        _ => TBA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(value: serde_json::Value) -> Section {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_exam_schedule() {
        let sections = vec![section(json!({
            "courseCode": "CSE110",
            "sectionName": "07",
            "sectionSchedule": {
                "midExamDate": "2026-03-12",
                "midExamStartTime": "09:00:00",
                "midExamEndTime": "10:30:00",
                "finalExamDate": "2026-05-20",
                "finalExamStartTime": "14:00:00",
                "finalExamEndTime": "16:00:00"
            }
        }))];
        let entries = ExamEntry::collect(&sections);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mid_date, "2026-03-12");
        assert_eq!(entries[0].mid_time, "9:00 AM - 10:30 AM");
        assert_eq!(entries[0].final_time, "2:00 PM - 4:00 PM");
    }

    #[test]
    fn test_partial_times_render_tba() {
        let sections = vec![section(json!({
            "courseCode": "MAT110",
            "sectionSchedule": {
                "midExamDate": "2026-03-14",
                "midExamStartTime": "11:00:00"
            }
        }))];
        let entries = ExamEntry::collect(&sections);
        assert_eq!(entries[0].mid_date, "2026-03-14");
        assert_eq!(entries[0].mid_time, TBA);
        assert_eq!(entries[0].final_date, TBA);
        assert_eq!(entries[0].final_time, TBA);
    }

    #[test]
    fn test_missing_schedule_still_yields_row() {
        let sections = vec![section(json!({ "courseCode": "PHY111", "sectionName": "03" }))];
        let entries = ExamEntry::collect(&sections);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].course_code, "PHY111");
        assert_eq!(entries[0].mid_date, TBA);
    }
}
