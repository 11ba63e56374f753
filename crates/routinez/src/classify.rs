//! Normalization of the routine API's heterogeneous response shapes.
//!
//! The generate endpoint is loose about errors: sometimes `error` is a
//! boolean flag with `title`/`message`/`suggestion` alongside, sometimes
//! it is the message string itself, sometimes a nested object, and
//! transport failures have no body at all. Everything funnels through
//! [`classify_response`] into one [`AppError`] shape so downstream
//! rendering never has to duck-type again.

use regex::Regex;
use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;
use tracing::debug;

use crate::model::Section;

/// Default headline when the server supplied none.
pub const DEFAULT_ERROR_TITLE: &str = "Error Detected";

/// Generic message for transport failures and empty bodies.
pub const GENERIC_FAILURE: &str = "Failed to generate routine. Please try again.";

/// The single normalized error shape every display path consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub title: String,
    pub message: String,
    pub suggestion: String,
}

impl AppError {
    /// Builds an error, synthesizing a suggestion when the server gave
    /// none.
    pub fn new(title: impl Into<String>, message: impl Into<String>, suggestion: Option<String>) -> Self {
        let title = title.into();
        let message = message.into();
        let suggestion = match suggestion.filter(|s| !s.trim().is_empty()) {
            Some(s) => s,
            None => synthesize_suggestion(&title, &message).to_string(),
        };
        Self { title, message, suggestion }
    }

    /// An error with the default title, from a bare message string.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(DEFAULT_ERROR_TITLE, message, None)
    }

    /// Whether this error should render as an exam-conflict report.
    pub fn is_exam_conflict(&self) -> bool {
        self.title.contains("Exam Conflicts")
            || self.message.contains("Exam Conflicts")
            || self.message.to_lowercase().contains("exam")
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// AI feedback attached to a successful routine: first line is the
/// headline, remaining non-empty lines are bullets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub headline: String,
    pub bullets: Vec<String>,
}

impl Feedback {
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines();
        let headline = lines.next().unwrap_or_default().trim().to_string();
        let bullets = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { headline, bullets }
    }
}

/// Outcome of classifying a generate-endpoint response body.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success {
        routine: Vec<Section>,
        feedback: Option<Feedback>,
    },
    Failure(AppError),
}

/// Classifies a response body from `POST /routine`.
pub fn classify_response(body: &Value) -> Outcome {
    match body.get("error") {
        // Absent or falsy error flag: a successful routine
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            let routine = body
                .get("routine")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            let feedback = body
                .get("feedback")
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .map(Feedback::parse);
            Outcome::Success { routine, feedback }
        }
        // Boolean flag with details at the top level
        Some(Value::Bool(true)) => {
            let title = body
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ERROR_TITLE);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("An error occurred");
            let suggestion = body
                .get("suggestion")
                .and_then(Value::as_str)
                .map(str::to_string);
            Outcome::Failure(AppError::new(title, message, suggestion))
        }
        // The error field itself is the message
        Some(Value::String(message)) => Outcome::Failure(AppError::from_message(message.clone())),
        // Nested structured error object
        Some(Value::Object(obj)) => {
            let title = obj
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_ERROR_TITLE);
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("An error occurred");
            let suggestion = obj
                .get("suggestion")
                .and_then(Value::as_str)
                .map(str::to_string);
            Outcome::Failure(AppError::new(title, message, suggestion))
        }
        Some(other) => {
            debug!(error = %other, "unrecognized error payload shape");
            Outcome::Failure(AppError::from_message(other.to_string()))
        }
    }
}

/// Keyword-matched guidance for errors the server did not annotate.
pub fn synthesize_suggestion(title: &str, message: &str) -> &'static str {
    let message = message.to_lowercase();
    let title = title.to_lowercase();

    if message.contains("conflict") || title.contains("conflict") {
        if message.contains("exam") {
            "Try selecting courses with non-overlapping exam schedules, or choose different sections of the same courses."
        } else if message.contains("time") {
            "Some of your selected courses have overlapping class times. Try choosing different sections or adjusting your course selection."
        } else {
            "Your selected courses have scheduling conflicts. Try different sections or remove conflicting courses."
        }
    } else if message.contains("preference") || title.contains("preference") {
        "Your day/time preferences are too restrictive. Try selecting more days or expanding your preferred time ranges."
    } else if message.contains("combination") || title.contains("combination") {
        "No valid schedule combinations found with your current selection. Try fewer courses or different sections."
    } else if message.contains("data") || title.contains("loading") {
        "Course data may be temporarily unavailable. Please refresh the page or try again in a few moments."
    } else {
        "Try selecting different courses, sections, or adjusting your day/time preferences to find compatible combinations."
    }
}

// The arrow glyphs the backend has used in conflict lines over time.
const CONFLICT_ARROWS: [&str; 3] = ["\u{27f7}", "\u{2194}", "->"];

static AFFECTED_COURSES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Affected Courses:\s*([^\n]*)").unwrap());
static MIDTERM_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Midterm Conflicts\n(.*?)(?:\nFinal Conflicts|$)").unwrap());
static MID_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Mid Conflicts\n(.*?)(?:\nFinal|$)").unwrap());
static FINAL_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Final Conflicts\n(.*)$").unwrap());
static FINAL_EXAM_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Final Exam Conflicts\n(.*)$").unwrap());

/// A parsed exam-conflict error message: affected course codes plus the
/// midterm and final conflict lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExamConflictReport {
    pub courses: Vec<String>,
    pub midterm_conflicts: Vec<String>,
    pub final_conflicts: Vec<String>,
}

impl ExamConflictReport {
    /// Parses a conflict message into its three buckets. Returns `None`
    /// when nothing parses out, in which case the caller should fall back
    /// to showing the raw message verbatim.
    pub fn parse(message: &str) -> Option<Self> {
        let message = message.trim();
        let mut report = ExamConflictReport::default();

        if let Some(caps) = AFFECTED_COURSES_RE.captures(message) {
            for code in caps[1].split(|c: char| c == ',' || c.is_whitespace()) {
                let code = code.trim();
                if !code.is_empty() && !report.courses.iter().any(|c| c == code) {
                    report.courses.push(code.to_string());
                }
            }
        }

        let midterm_block = MIDTERM_BLOCK_RE
            .captures(message)
            .or_else(|| MID_BLOCK_RE.captures(message));
        if let Some(caps) = midterm_block {
            report.midterm_conflicts = conflict_lines(&caps[1]);
        }

        let final_block = FINAL_BLOCK_RE
            .captures(message)
            .or_else(|| FINAL_EXAM_BLOCK_RE.captures(message));
        if let Some(caps) = final_block {
            report.final_conflicts = conflict_lines(&caps[1]);
        }

        if report.courses.is_empty()
            && report.midterm_conflicts.is_empty()
            && report.final_conflicts.is_empty()
        {
            None
        } else {
            Some(report)
        }
    }
}

fn conflict_lines(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| CONFLICT_ARROWS.iter().any(|arrow| line.contains(arrow)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_with_routine_and_feedback() {
        let body = json!({
            "routine": [ { "courseCode": "CSE110", "sectionName": "07" } ],
            "feedback": "Balanced schedule.\nNo early classes.\nTwo free days."
        });
        match classify_response(&body) {
            Outcome::Success { routine, feedback } => {
                assert_eq!(routine.len(), 1);
                assert_eq!(routine[0].course_code, "CSE110");
                let feedback = feedback.unwrap();
                assert_eq!(feedback.headline, "Balanced schedule.");
                assert_eq!(feedback.bullets.len(), 2);
            }
            Outcome::Failure(e) => panic!("expected success, got {e}"),
        }
    }

    #[test]
    fn test_false_error_flag_is_success() {
        let body = json!({ "error": false, "routine": [] });
        assert!(matches!(classify_response(&body), Outcome::Success { .. }));
    }

    #[test]
    fn test_structured_error_with_flag() {
        let body = json!({
            "error": true,
            "title": "No Valid Combination",
            "message": "No valid combination of sections found.",
            "suggestion": "Drop a course."
        });
        match classify_response(&body) {
            Outcome::Failure(e) => {
                assert_eq!(e.title, "No Valid Combination");
                assert_eq!(e.suggestion, "Drop a course.");
            }
            Outcome::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_string_error_gets_default_title_and_suggestion() {
        let body = json!({ "error": "Time conflict between sections" });
        match classify_response(&body) {
            Outcome::Failure(e) => {
                assert_eq!(e.title, DEFAULT_ERROR_TITLE);
                assert_eq!(e.message, "Time conflict between sections");
                assert!(e.suggestion.contains("overlapping class times"));
            }
            Outcome::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_nested_error_object() {
        let body = json!({ "error": { "title": "Bad Data", "message": "Course data missing" } });
        match classify_response(&body) {
            Outcome::Failure(e) => {
                assert_eq!(e.title, "Bad Data");
                assert!(e.suggestion.contains("temporarily unavailable"));
            }
            Outcome::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_suggestion_keyword_pipeline() {
        assert!(synthesize_suggestion("", "exam conflict found").contains("exam schedules"));
        assert!(synthesize_suggestion("Conflict", "time overlap").contains("overlapping class times"));
        assert!(synthesize_suggestion("", "a conflict").contains("scheduling conflicts"));
        assert!(synthesize_suggestion("", "preference too narrow").contains("too restrictive"));
        assert!(synthesize_suggestion("", "no combination").contains("No valid schedule combinations"));
        assert!(synthesize_suggestion("Loading", "oops").contains("temporarily unavailable"));
        assert!(synthesize_suggestion("", "anything else").contains("compatible combinations"));
    }

    #[test]
    fn test_server_suggestion_wins_over_synthesized() {
        let e = AppError::new("Conflict", "time conflict", Some("Use section 2.".to_string()));
        assert_eq!(e.suggestion, "Use section 2.");
    }

    #[test]
    fn test_feedback_parse_single_line() {
        let f = Feedback::parse("All good");
        assert_eq!(f.headline, "All good");
        assert!(f.bullets.is_empty());
    }

    #[test]
    fn test_exam_conflict_detection() {
        let e = AppError::from_message("Exam Conflicts:\nAffected Courses: CSE110");
        assert!(e.is_exam_conflict());
        let e = AppError::from_message("midterm exam overlaps");
        assert!(e.is_exam_conflict());
        let e = AppError::from_message("time conflict");
        assert!(!e.is_exam_conflict());
    }

    #[test]
    fn test_exam_conflict_report_parse() {
        let message = "Exam Conflicts: review your picks. Affected Courses: CSE110 CSE220\nMidterm Conflicts\nCSE110 \u{27f7} CSE220\nFinal Conflicts\n";
        let report = ExamConflictReport::parse(message).unwrap();
        assert_eq!(report.courses, vec!["CSE110", "CSE220"]);
        assert_eq!(report.midterm_conflicts.len(), 1);
        assert!(report.final_conflicts.is_empty());
    }

    #[test]
    fn test_exam_conflict_report_dedups_courses() {
        let message = "Affected Courses: CSE110, CSE110, CSE220";
        let report = ExamConflictReport::parse(message).unwrap();
        assert_eq!(report.courses, vec!["CSE110", "CSE220"]);
    }

    #[test]
    fn test_exam_conflict_report_accepts_ascii_arrow() {
        let message = "Midterm Conflicts\nCSE110 -> CSE220\nnot a conflict line";
        let report = ExamConflictReport::parse(message).unwrap();
        assert_eq!(report.midterm_conflicts, vec!["CSE110 -> CSE220"]);
    }

    #[test]
    fn test_exam_conflict_report_unparseable_is_none() {
        assert_eq!(ExamConflictReport::parse("something went wrong"), None);
    }
}
