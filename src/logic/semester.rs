use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Observing semester a date falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterTag {
    /// 1 or 2
    pub semester: i32,
    pub year: i32,
}

/// Semester 1 runs May to October. Semester 2 runs November to April and
/// belongs to the year in which it started.
pub fn semester_for(as_of: NaiveDate) -> SemesterTag {
    let month = as_of.month();
    if (5..=10).contains(&month) {
        SemesterTag {
            semester: 1,
            year: as_of.year(),
        }
    } else {
        SemesterTag {
            semester: 2,
            year: if month > 10 { as_of.year() } else { as_of.year() - 1 },
        }
    }
}
