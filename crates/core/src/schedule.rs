//! Derived views over viewing times.

use std::collections::BTreeSet;

use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::types::Timestamp;

/// Display format for a time of day.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Times of day (`HH:MM`, local to `offset`) of the viewings that fall on
/// the local calendar date `today`, deduplicated and sorted ascending.
pub fn today_times(watched: &[Timestamp], today: NaiveDate, offset: FixedOffset) -> Vec<String> {
    watched
        .iter()
        .map(|ts| ts.with_timezone(&offset))
        .filter(|local| local.date_naive() == today)
        .map(|local| local.format(TIME_OF_DAY_FORMAT).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The current calendar date at `offset`.
pub fn local_today(now: Timestamp, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// UTC bounds `[start, end)` of the local calendar date `day` at `offset`.
pub fn local_day_bounds(day: NaiveDate, offset: FixedOffset) -> (Timestamp, Timestamp) {
    let local_midnight = day.and_time(NaiveTime::MIN);
    let start = offset
        .from_local_datetime(&local_midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local_midnight));
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn duplicate_times_collapse() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let watched = [at(2024, 1, 1, 10, 0), at(2024, 1, 1, 10, 0)];
        assert_eq!(today_times(&watched, today, utc()), vec!["10:00"]);
    }

    #[test]
    fn other_days_are_excluded() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let watched = [
            at(2024, 1, 1, 18, 30),
            at(2023, 12, 31, 13, 0),
            at(2024, 1, 2, 13, 0),
            at(2024, 1, 1, 13, 0),
        ];
        assert_eq!(today_times(&watched, today, utc()), vec!["13:00", "18:30"]);
    }

    #[test]
    fn offset_shifts_the_calendar_day() {
        // 2024-01-01T20:00Z is 2024-01-02T05:00 at UTC+9.
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let watched = [at(2024, 1, 1, 20, 0)];
        let jan_2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(today_times(&watched, jan_2, jst), vec!["05:00"]);
        let jan_1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(today_times(&watched, jan_1, jst).is_empty());
    }

    #[test]
    fn local_today_uses_offset() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = at(2024, 1, 1, 20, 0);
        assert_eq!(local_today(now, utc()), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(local_today(now, jst), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn day_bounds_follow_the_offset() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let (start, end) = local_day_bounds(day, tokyo);
        assert_eq!(start, at(2023, 12, 31, 15, 0));
        assert_eq!(end, at(2024, 1, 1, 15, 0));
    }
}
