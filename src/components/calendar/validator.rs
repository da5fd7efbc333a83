use super::booked::BookedDaySet;

/// Verdict on a candidate end day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Accept,
    Reject { booked_day: u32 },
}

/// Check the inclusive range `[start_day, end_day]` of one month against the
/// booked days. Both ends are checked. An empty range (`start_day > end_day`)
/// is accepted; callers only pass `end_day > start_day`.
pub fn validate_selection(start_day: u32, end_day: u32, booked: &BookedDaySet) -> Validation {
    match (start_day..=end_day).find(|day| booked.contains(*day)) {
        Some(booked_day) => Validation::Reject { booked_day },
        None => Validation::Accept,
    }
}
