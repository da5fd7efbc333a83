use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Current calendar date in the given timezone
pub fn today_in(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

/// Number of days in a month, `None` for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

/// First and last instant of a month in the given timezone, as UTC
pub fn month_bounds(year: i32, month: u32, tz: &Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let last_day = days_in_month(year, month)?;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?.and_time(NaiveTime::MIN);
    let last = NaiveDate::from_ymd_opt(year, month, last_day)?
        .and_hms_milli_opt(23, 59, 59, 999)?;

    // In a DST fold the month starts at the first occurrence and ends at the last
    let start = local_to_utc(tz, &first, Fold::Earliest)?;
    let end = local_to_utc(tz, &last, Fold::Latest)?;

    Some((start, end))
}

/// Which instant to take when a wall-clock time occurs twice
#[derive(Debug, Clone, Copy)]
enum Fold {
    Earliest,
    Latest,
}

/// Resolve a wall-clock time to UTC, skipping forward over DST gaps
fn local_to_utc(tz: &Tz, naive: &NaiveDateTime, fold: Fold) -> Option<DateTime<Utc>> {
    let resolve = |naive: &NaiveDateTime| {
        let local = tz.from_local_datetime(naive);
        match fold {
            Fold::Earliest => local.earliest(),
            Fold::Latest => local.latest(),
        }
    };

    if let Some(dt) = resolve(naive) {
        return Some(dt.with_timezone(&Utc));
    }
    let shifted = naive.checked_add_signed(Duration::hours(1))?;
    resolve(&shifted).map(|dt| dt.with_timezone(&Utc))
}

/// Format an instant the way the backend expects (millisecond precision, `Z`)
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a date from an ISO string.
///
/// RFC 3339 instants keep the calendar date written in their own offset.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 1), Some(31));
        assert_eq!(days_in_month(2024, 2), Some(29)); // Leap year
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 6), Some(30));
        assert_eq!(days_in_month(2024, 12), Some(31));

        // Invalid months
        assert_eq!(days_in_month(2024, 0), None);
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn test_month_bounds_utc() {
        let (start, end) = month_bounds(2024, 6, &chrono_tz::UTC).unwrap();
        assert_eq!(format_instant(&start), "2024-06-01T00:00:00.000Z");
        assert_eq!(format_instant(&end), "2024-06-30T23:59:59.999Z");

        // December rolls into the next year correctly
        let (start, end) = month_bounds(2024, 12, &chrono_tz::UTC).unwrap();
        assert_eq!(format_instant(&start), "2024-12-01T00:00:00.000Z");
        assert_eq!(format_instant(&end), "2024-12-31T23:59:59.999Z");
    }

    #[test]
    fn test_month_bounds_with_timezone() {
        // Helsinki is UTC+3 in summer
        let (start, end) = month_bounds(2024, 6, &chrono_tz::Europe::Helsinki).unwrap();
        assert_eq!(format_instant(&start), "2024-05-31T21:00:00.000Z");
        assert_eq!(format_instant(&end), "2024-06-30T20:59:59.999Z");
    }

    #[test]
    fn test_parse_iso_date() {
        let june_10 = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        assert_eq!(parse_iso_date("2024-06-10T00:00:00Z"), Some(june_10));
        assert_eq!(parse_iso_date("2024-06-10T00:00:00.000Z"), Some(june_10));
        assert_eq!(parse_iso_date("2024-06-10"), Some(june_10));
        assert_eq!(parse_iso_date(" 2024-06-10 "), Some(june_10));
        assert_eq!(parse_iso_date("2024-06-10T12:30:00"), Some(june_10));

        // The date as written in the instant's own offset
        assert_eq!(parse_iso_date("2024-06-10T00:30:00+03:00"), Some(june_10));

        // Invalid input
        assert_eq!(parse_iso_date("June 10th"), None);
        assert_eq!(parse_iso_date("2024-02-30"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn test_month_bounds_across_fold() {
        // Cairo leaves DST at midnight ending 2024-10-31, so 23:59 occurs twice
        let (start, end) = month_bounds(2024, 10, &chrono_tz::Africa::Cairo).unwrap();
        assert_eq!(format_instant(&start), "2024-09-30T21:00:00.000Z");
        assert_eq!(format_instant(&end), "2024-10-31T21:59:59.999Z");
    }
}
