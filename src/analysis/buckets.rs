use crate::models::analytics::WeekBucket;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub const MS_PER_DAY: f64 = 86_400_000.0;
pub const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

/// First day of the calendar week (UTC) containing `ts`.
pub fn week_start_date(ts: DateTime<Utc>, week_start: WeekStart) -> NaiveDate {
    let date = ts.date_naive();
    let offset = match week_start {
        WeekStart::Monday => date.weekday().num_days_from_monday(),
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
    };
    date - Duration::days(i64::from(offset))
}

pub fn bucket_for_date(start: NaiveDate) -> WeekBucket {
    WeekBucket {
        key: start.format("%Y-%m-%d").to_string(),
        label: start.format("%b %-d").to_string(),
    }
}

pub fn week_bucket(ts: DateTime<Utc>, week_start: WeekStart) -> WeekBucket {
    bucket_for_date(week_start_date(ts, week_start))
}

/// Exclusive end instant of the week that begins on `start`.
pub fn week_end(start: NaiveDate) -> DateTime<Utc> {
    (start + Duration::days(7)).and_time(NaiveTime::MIN).and_utc()
}

/// Every week from the one containing `first` through the one containing
/// `last`, inclusive, with no gaps. Empty when `last` precedes `first`.
pub fn week_range(first: DateTime<Utc>, last: DateTime<Utc>, week_start: WeekStart) -> Vec<WeekBucket> {
    let mut current = week_start_date(first, week_start);
    let end = week_start_date(last, week_start);
    let mut weeks = Vec::new();
    while current <= end {
        weeks.push(bucket_for_date(current));
        current += Duration::days(7);
    }
    weeks
}

/// Parses a bucket key back to the week's first day.
pub fn parse_week_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_DAY
}

pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn same_week_yields_same_key_regardless_of_weekday() {
        // 2026-10-12 is a Monday.
        let monday = Utc.with_ymd_and_hms(2026, 10, 12, 0, 0, 0).unwrap();
        let sunday_night = Utc.with_ymd_and_hms(2026, 10, 18, 23, 59, 59).unwrap();

        let a = week_bucket(monday, WeekStart::Monday);
        let b = week_bucket(sunday_night, WeekStart::Monday);
        assert_eq!(a, b);
        assert_eq!(a.key, "2026-10-12");
        assert_eq!(a.label, "Oct 12");
    }

    #[test]
    fn sunday_start_shifts_bucket_boundary() {
        let sunday = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();
        assert_eq!(week_bucket(sunday, WeekStart::Monday).key, "2026-10-12");
        assert_eq!(week_bucket(sunday, WeekStart::Sunday).key, "2026-10-18");
    }

    #[test]
    fn week_range_fills_gaps() {
        let first = Utc.with_ymd_and_hms(2026, 9, 30, 12, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap();
        let keys: Vec<String> = week_range(first, last, WeekStart::Monday)
            .into_iter()
            .map(|w| w.key)
            .collect();

        assert_eq!(keys, vec!["2026-09-28", "2026-10-05", "2026-10-12", "2026-10-19"]);
        assert!(week_range(last, first, WeekStart::Monday).is_empty());
    }

    #[test]
    fn durations_use_exact_milliseconds() {
        let a = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap();
        assert_eq!(days_between(a, b), 1.5);
        assert_eq!(hours_between(a, b), 36.0);
    }
}
