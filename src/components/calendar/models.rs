use crate::components::availability::ListingRef;
use crate::error::{calendar_error, config_error, invalid_input, AppResult, Error};
use crate::utils::time::{days_in_month, month_bounds};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Month currently shown in the calendar grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayedMonth {
    year: i32,
    month: u32,
}

impl DisplayedMonth {
    /// Create a month, validating the month number and year range
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if days_in_month(year, month).is_none() {
            return Err(invalid_input(&format!("Invalid month: {}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Number of days in this month
    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month).unwrap_or(0)
    }

    /// Neighbouring month in the given direction
    pub fn shifted(&self, direction: Direction) -> Self {
        let (year, month) = match (direction, self.month) {
            (Direction::Previous, 1) => (self.year - 1, 12),
            (Direction::Previous, m) => (self.year, m - 1),
            (Direction::Next, 12) => (self.year + 1, 1),
            (Direction::Next, m) => (self.year, m + 1),
        };
        Self::new(year, month).unwrap_or(*self)
    }

    /// Full date for a day number of this month
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// First and last instant of the month in the given timezone
    pub fn bounds(&self, tz: &Tz) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        month_bounds(self.year, self.month, tz)
            .ok_or_else(|| calendar_error(&format!("Cannot compute bounds for {}", self)))
    }
}

impl fmt::Display for DisplayedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Month navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Previous,
    Next,
}

/// How the calendar treats availability it could not load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityPolicy {
    /// Assume nothing is booked and allow commits
    #[default]
    FailOpen,
    /// Refuse commits until availability has loaded
    FailClosed,
}

impl FromStr for AvailabilityPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-open" => Ok(AvailabilityPolicy::FailOpen),
            "fail-closed" => Ok(AvailabilityPolicy::FailClosed),
            other => Err(config_error(&format!("Unknown availability policy: {}", other))),
        }
    }
}

/// Load state of the booked days for the displayed month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Loading,
    Loaded,
    /// The fetch failed and the month is shown as fully available
    Unavailable,
}

/// A committed start/end date pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Committed range handed to the booking form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSelection {
    pub listing: ListingRef,
    #[serde(flatten)]
    pub range: SelectedRange,
}

/// Selection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Idle,
    Selecting { start: NaiveDate },
    Committed { start: NaiveDate, end: NaiveDate },
}

impl Selection {
    pub fn start(&self) -> Option<NaiveDate> {
        match self {
            Selection::Idle => None,
            Selection::Selecting { start } | Selection::Committed { start, .. } => Some(*start),
        }
    }
}

/// Why a day click did not change the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum IgnoreReason {
    /// Day number does not exist in the displayed month
    InvalidDay,
    /// The clicked day itself is booked
    Booked,
    /// The clicked day is before today
    Past,
    /// A booked day lies inside the candidate range
    #[serde(rename_all = "camelCase")]
    RangeBlocked { booked_day: u32 },
    /// Availability is not known and the policy is fail-closed
    AvailabilityUnknown,
}

/// Result of a day click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ClickOutcome {
    Ignored { reason: IgnoreReason },
    Started { start: NaiveDate },
    Committed { range: SelectedRange },
}

/// Everything a renderer needs to draw the calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSnapshot {
    pub listing: ListingRef,
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub status: AvailabilityStatus,
    pub booked_days: Vec<u32>,
    pub selection: Selection,
    pub hover: Option<NaiveDate>,
    pub preview: Option<SelectedRange>,
    pub generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::availability::ItemType;

    #[test]
    fn test_month_navigation() {
        let june = DisplayedMonth::new(2024, 6).unwrap();
        assert_eq!(june.shifted(Direction::Next), DisplayedMonth::new(2024, 7).unwrap());
        assert_eq!(june.shifted(Direction::Previous), DisplayedMonth::new(2024, 5).unwrap());

        // Year boundaries
        let december = DisplayedMonth::new(2024, 12).unwrap();
        assert_eq!(december.shifted(Direction::Next), DisplayedMonth::new(2025, 1).unwrap());
        let january = DisplayedMonth::new(2025, 1).unwrap();
        assert_eq!(january.shifted(Direction::Previous), december);
    }

    #[test]
    fn test_month_validation() {
        assert!(DisplayedMonth::new(2024, 0).is_err());
        assert!(DisplayedMonth::new(2024, 13).is_err());
        assert_eq!(DisplayedMonth::new(2024, 2).unwrap().days(), 29);
    }

    #[test]
    fn test_month_dates() {
        let june = DisplayedMonth::new(2024, 6).unwrap();
        assert_eq!(june.date(10), NaiveDate::from_ymd_opt(2024, 6, 10));
        assert_eq!(june.date(0), None);
        assert_eq!(june.date(31), None);
        assert!(june.contains(&NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!june.contains(&NaiveDate::from_ymd_opt(2023, 6, 30).unwrap()));
        assert_eq!(june.to_string(), "2024-06");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("fail-open".parse::<AvailabilityPolicy>().unwrap(), AvailabilityPolicy::FailOpen);
        assert_eq!("FAIL_CLOSED".parse::<AvailabilityPolicy>().unwrap(), AvailabilityPolicy::FailClosed);
        assert!("sometimes".parse::<AvailabilityPolicy>().is_err());
    }

    #[test]
    fn test_selection_wire_format() {
        let range = SelectedRange {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        };
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json, serde_json::json!({ "startDate": "2024-06-05", "endDate": "2024-06-10" }));

        let selection = BookingSelection {
            listing: ListingRef::new("V1", ItemType::Vehicle),
            range,
        };
        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["startDate"], "2024-06-05");
        assert_eq!(json["listing"]["itemType"], "vehicle");

        let outcome = ClickOutcome::Ignored {
            reason: IgnoreReason::RangeBlocked { booked_day: 7 },
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["outcome"], "ignored");
        assert_eq!(json["reason"]["reason"], "rangeBlocked");
        assert_eq!(json["reason"]["bookedDay"], 7);
    }
}
