use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

const POSITIONS: [&str; 3] = ["first", "second", "third"];

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in the half-open range `[start, end)`; negative when `end` precedes `start`.
pub fn busday_count(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return -busday_count(end, start);
    }

    let days = (end - start).num_days();
    let full_weeks = days / 7;
    let remainder = (start + Duration::days(full_weeks * 7))
        .iter_days()
        .take_while(|day| *day < end)
        .filter(|day| is_business_day(*day))
        .count() as i64;

    full_weeks * 5 + remainder
}

/// Business days between two dates counting both ends, minus one. Never negative.
pub fn business_days_elapsed(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    (busday_count(start, end + Duration::days(1)) - 1).max(0)
}

/// Sorted distinct calendar dates.
pub fn distinct_dates<I>(dates: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Non-zero business-day gaps between consecutive distinct dates.
pub fn business_gaps(dates: &[NaiveDate]) -> Vec<i64> {
    distinct_dates(dates.iter().copied())
        .windows(2)
        .map(|pair| busday_count(pair[0], pair[1]))
        .filter(|gap| *gap > 0)
        .collect()
}

/// Maximum business-day gap allowed between each of four consecutive update days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadencePattern {
    pub name: &'static str,
    pub ceilings: [i64; 3],
}

impl CadencePattern {
    pub const ONE_ONE_ONE: CadencePattern = CadencePattern {
        name: "1-1-1",
        ceilings: [1, 1, 1],
    };
    pub const TWO_TWO_ONE: CadencePattern = CadencePattern {
        name: "2-2-1",
        ceilings: [2, 2, 1],
    };
    pub const THREE_TWO_ONE: CadencePattern = CadencePattern {
        name: "3-2-1",
        ceilings: [3, 2, 1],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapViolation {
    pub position: usize,
    pub gap: i64,
    pub ceiling: i64,
}

impl fmt::Display for GapViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = if self.ceiling == 1 { "day" } else { "days" };
        let position = POSITIONS.get(self.position).copied().unwrap_or("later");
        write!(f, "{position} gap > {} {unit}", self.ceiling)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CadenceOutcome {
    Pass,
    Violations(Vec<GapViolation>),
    NotEnoughUniqueDays,
    NotEnoughValidGaps,
}

impl CadenceOutcome {
    pub fn label(&self) -> String {
        match self {
            CadenceOutcome::Pass => "Pass".to_string(),
            CadenceOutcome::Violations(violations) => {
                let detail = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Fail ({detail})")
            }
            CadenceOutcome::NotEnoughUniqueDays => "Not Enough Unique Days".to_string(),
            CadenceOutcome::NotEnoughValidGaps => "Not Enough Valid Gaps".to_string(),
        }
    }
}

/// Compares the first three business-day gaps between update days against the pattern.
pub fn check_cadence(pattern: &CadencePattern, dates: &[NaiveDate]) -> CadenceOutcome {
    let unique = distinct_dates(dates.iter().copied());
    if unique.len() < 4 {
        return CadenceOutcome::NotEnoughUniqueDays;
    }

    let gaps = business_gaps(&unique);
    if gaps.len() < 3 {
        return CadenceOutcome::NotEnoughValidGaps;
    }

    let violations: Vec<GapViolation> = gaps
        .iter()
        .zip(pattern.ceilings.iter())
        .enumerate()
        .filter(|(_, (gap, ceiling))| gap > ceiling)
        .map(|(position, (gap, ceiling))| GapViolation {
            position,
            gap: *gap,
            ceiling: *ceiling,
        })
        .collect();

    if violations.is_empty() {
        CadenceOutcome::Pass
    } else {
        CadenceOutcome::Violations(violations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityOutcome {
    Pass,
    GapExceeded,
    InvalidDates,
}

impl ContinuityOutcome {
    pub fn label(self) -> &'static str {
        match self {
            ContinuityOutcome::Pass => "Pass",
            ContinuityOutcome::GapExceeded => "Fail (Gap > 1 business day)",
            ContinuityOutcome::InvalidDates => "Invalid Opened/Closed Date",
        }
    }
}

/// Fails when any stretch between opening, updates and closure spans more than one business day.
pub fn check_uninterrupted(
    opened: Option<NaiveDate>,
    updates: &[NaiveDate],
    closed: Option<NaiveDate>,
) -> ContinuityOutcome {
    let dates = distinct_dates(
        opened
            .into_iter()
            .chain(updates.iter().copied())
            .chain(closed),
    );
    if dates.len() < 2 {
        return ContinuityOutcome::InvalidDates;
    }

    if business_gaps(&dates).iter().any(|gap| *gap > 1) {
        ContinuityOutcome::GapExceeded
    } else {
        ContinuityOutcome::Pass
    }
}
