use super::models::DisplayedMonth;
use crate::utils::time::parse_iso_date;
use chrono::Datelike;
use std::collections::BTreeSet;
use tracing::warn;

/// Days of the displayed month that cannot be selected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookedDaySet {
    days: BTreeSet<u32>,
}

impl BookedDaySet {
    /// Empty set, used on the fail-open path
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from day numbers directly
    pub fn from_days(days: impl IntoIterator<Item = u32>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Keep the day numbers of the dates that fall inside `month`
    pub fn from_iso_dates<I, S>(dates: I, month: &DisplayedMonth) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut days = BTreeSet::new();
        for raw in dates {
            let raw = raw.as_ref();
            match parse_iso_date(raw) {
                Some(date) if month.contains(&date) => {
                    days.insert(date.day());
                }
                Some(_) => {}
                None => warn!("Skipping unparseable booked date: {:?}", raw),
            }
        }
        Self { days }
    }

    pub fn contains(&self, day: u32) -> bool {
        self.days.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Booked days in ascending order
    pub fn days(&self) -> Vec<u32> {
        self.days.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_to_displayed_month() {
        let june = DisplayedMonth::new(2024, 6).unwrap();
        let set = BookedDaySet::from_iso_dates(
            [
                "2024-05-31T00:00:00Z",
                "2024-06-10T00:00:00Z",
                "2024-06-11T00:00:00Z",
                "2024-07-01T00:00:00Z",
                "2023-06-15T00:00:00Z",
            ],
            &june,
        );
        assert_eq!(set.days(), vec![10, 11]);
    }

    #[test]
    fn test_duplicates_and_bad_entries() {
        let june = DisplayedMonth::new(2024, 6).unwrap();
        let dates = vec![
            "2024-06-10".to_string(),
            "2024-06-10T00:00:00Z".to_string(),
            "garbage".to_string(),
        ];
        let set = BookedDaySet::from_iso_dates(&dates, &june);
        assert_eq!(set.len(), 1);
        assert!(set.contains(10));
        assert!(!set.contains(11));
    }

    #[test]
    fn test_empty() {
        let june = DisplayedMonth::new(2024, 6).unwrap();
        let set = BookedDaySet::from_iso_dates(Vec::<String>::new(), &june);
        assert!(set.is_empty());
        assert_eq!(set, BookedDaySet::empty());
    }
}
