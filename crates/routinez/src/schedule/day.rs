//! Days of the week, Sunday-first to match the university calendar.

use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A day of the week. Ordering follows the Sunday-first week used by the
/// routine grid and the campus-days summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Titlecase name, the canonical display form.
    pub fn name(self) -> &'static str {
        match self {
            Day::Sunday => "Sunday",
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }

    /// Uppercase name, the wire form expected by the routine API.
    pub fn upper(self) -> &'static str {
        match self {
            Day::Sunday => "SUNDAY",
            Day::Monday => "MONDAY",
            Day::Tuesday => "TUESDAY",
            Day::Wednesday => "WEDNESDAY",
            Day::Thursday => "THURSDAY",
            Day::Friday => "FRIDAY",
            Day::Saturday => "SATURDAY",
        }
    }

    /// Three-letter column header ("Sun", "Mon", ...).
    pub fn abbrev(self) -> &'static str {
        &self.name()[..3]
    }
}

impl FromStr for Day {
    type Err = ();

    /// Case-insensitive; the API mixes "MONDAY", "Monday" and "monday".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Day::ALL
            .iter()
            .copied()
            .find(|day| day.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}
