use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Timelike,
    Utc,
};
use once_cell::sync::Lazy;

/// Manila runs at a fixed UTC+8 with no daylight saving, for all of history
/// this system cares about. Every Manila-relative read or write must go
/// through this module; the server's ambient timezone is never consulted.
pub const MANILA_OFFSET_SECS: i32 = 8 * 3600;

pub static MANILA: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(MANILA_OFFSET_SECS).expect("+08:00 is a valid offset"));

/// The single shift point from an instant to Manila wall-clock time.
pub fn manila_time(t: DateTime<Utc>) -> DateTime<FixedOffset> {
    t.with_timezone(&*MANILA)
}

/// Manila calendar day of an instant.
pub fn manila_date(t: DateTime<Utc>) -> NaiveDate {
    manila_time(t).date_naive()
}

/// Day key used for grouping punches, e.g. "2024-03-04".
pub fn manila_date_key(t: DateTime<Utc>) -> String {
    manila_time(t).format("%Y-%m-%d").to_string()
}

/// Inverse of `manila_date_key`. Bulk-grouped day values come back as
/// strings; `None` routes the row into the best-effort substitution path.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// UTC instant equal to the given Manila wall-clock parts. Out-of-range
/// parts (month 13, hour 24, ...) yield `None`.
pub fn from_manila_parts(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<DateTime<Utc>> {
    let local = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    Some(manila_local_to_utc(local))
}

/// UTC instant of 00:00:00.000 Manila on the given calendar day.
pub fn start_of_manila_day(day: NaiveDate) -> DateTime<Utc> {
    manila_local_to_utc(day.and_time(NaiveTime::MIN))
}

/// UTC instant of 23:59:59.999 Manila on the given calendar day.
pub fn end_of_manila_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_manila_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

/// UTC instant of Manila midnight on the instant's Manila calendar day.
pub fn manila_start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    start_of_manila_day(manila_date(t))
}

pub fn manila_end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    end_of_manila_day(manila_date(t))
}

pub fn manila_hours(t: DateTime<Utc>) -> u32 {
    manila_time(t).hour()
}

pub fn manila_minutes(t: DateTime<Utc>) -> u32 {
    manila_time(t).minute()
}

/// Minutes since Manila midnight, in [0, 1440).
pub fn manila_minute_of_day(t: DateTime<Utc>) -> u32 {
    manila_hours(t) * 60 + manila_minutes(t)
}

/// True iff the Manila wall clock is strictly past `start_hour:grace_minutes`.
/// Arriving exactly on the grace boundary is not late.
pub fn is_late_in_manila(t: DateTime<Utc>, start_hour: u32, grace_minutes: u32) -> bool {
    manila_minute_of_day(t) > start_hour * 60 + grace_minutes
}

/// Display formatting in Manila time with a chrono format string.
pub fn format_manila(t: DateTime<Utc>, fmt: &str) -> String {
    manila_time(t).format(fmt).to_string()
}

/// ISO-8601 with an explicit "+08:00" offset and millisecond precision.
/// Never a "Z" suffix, so consumers without timezone-database support still
/// read the wall-clock parts correctly.
pub fn format_manila_iso(t: DateTime<Utc>) -> String {
    manila_time(t).to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// Parses "yyyy-MM-dd", "yyyy-MM-ddTHH:MM" or "yyyy-MM-ddTHH:MM:SS" as
/// Manila wall-clock time. A missing time part defaults to midnight.
pub fn parse_manila_local(s: &str) -> Option<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })?;
    Some(manila_local_to_utc(local))
}

/// Canonical rendering of a record's calendar day: noon UTC of that date.
/// Noon keeps `new Date(record.date)` in any viewer timezone on the same
/// calendar day, where midnight would drift a day in western offsets.
pub fn date_at_utc_noon(day: NaiveDate) -> DateTime<Utc> {
    (day.and_time(NaiveTime::MIN) + Duration::hours(12)).and_utc()
}

fn manila_local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    (local - Duration::seconds(MANILA_OFFSET_SECS as i64)).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn shifts_across_the_utc_day_boundary() {
        // 16:30Z is already the next day in Manila.
        let t = utc("2024-01-01T16:30:00Z");
        assert_eq!(manila_date_key(t), "2024-01-02");
        assert_eq!(manila_hours(t), 0);
        assert_eq!(manila_minutes(t), 30);
        assert_eq!(manila_minute_of_day(t), 30);
    }

    #[test]
    fn minute_of_day_matches_shifted_utc_reading() {
        for s in [
            "2024-01-01T16:30:00Z",
            "2024-03-04T00:05:00Z",
            "2023-12-31T15:59:59Z",
            "2024-06-15T23:59:00Z",
        ] {
            let t = utc(s);
            let shifted = t + Duration::hours(8);
            assert_eq!(
                manila_minute_of_day(t),
                shifted.hour() * 60 + shifted.minute(),
                "mismatch for {s}"
            );
        }
    }

    #[test]
    fn day_bounds_bracket_the_instant() {
        for s in [
            "2024-01-01T16:30:00Z",
            "2024-03-04T00:00:00Z",
            "2024-03-04T15:59:59Z",
        ] {
            let t = utc(s);
            let start = manila_start_of_day(t);
            let end = manila_end_of_day(t);
            assert!(start <= t && t <= end, "bounds do not bracket {s}");
            assert_eq!((end - start).num_milliseconds(), 86_399_999);
        }
    }

    #[test]
    fn start_of_day_is_manila_midnight() {
        let t = utc("2024-03-04T10:00:00Z");
        // Manila midnight on 2024-03-04 is 16:00Z the previous day.
        assert_eq!(manila_start_of_day(t), utc("2024-03-03T16:00:00Z"));
        assert_eq!(manila_end_of_day(t), utc("2024-03-04T15:59:59.999Z"));
    }

    #[test]
    fn manila_parts_round_trip() {
        for (y, mo, d, h, mi) in [
            (2024, 3, 4, 8, 5),
            (2024, 1, 1, 0, 0),
            (2024, 12, 31, 23, 59),
            (2023, 2, 28, 6, 30),
        ] {
            let t = from_manila_parts(y, mo, d, h, mi, 0).unwrap();
            assert_eq!(manila_date_key(t), format!("{y:04}-{mo:02}-{d:02}"));
            assert_eq!(manila_hours(t), h);
            assert_eq!(manila_minutes(t), mi);
        }
    }

    #[test]
    fn manila_parts_normalize_into_previous_utc_day() {
        // 07:00 Manila is 23:00Z the day before.
        let t = from_manila_parts(2024, 3, 4, 7, 0, 0).unwrap();
        assert_eq!(t, utc("2024-03-03T23:00:00Z"));
    }

    #[test]
    fn invalid_parts_are_rejected() {
        assert!(from_manila_parts(2024, 13, 1, 0, 0, 0).is_none());
        assert!(from_manila_parts(2024, 2, 30, 0, 0, 0).is_none());
        assert!(from_manila_parts(2024, 3, 4, 24, 0, 0).is_none());
    }

    #[test]
    fn iso_format_carries_explicit_offset() {
        let t = utc("2024-03-04T00:05:00Z");
        assert_eq!(format_manila_iso(t), "2024-03-04T08:05:00.000+08:00");
        assert!(!format_manila_iso(t).ends_with('Z'));
    }

    #[test]
    fn parses_local_strings() {
        assert_eq!(
            parse_manila_local("2024-03-04T08:05"),
            Some(utc("2024-03-04T00:05:00Z"))
        );
        assert_eq!(
            parse_manila_local("2024-03-04T08:05:30"),
            Some(utc("2024-03-04T00:05:30Z"))
        );
        // Date-only defaults to Manila midnight.
        assert_eq!(
            parse_manila_local("2024-03-04"),
            Some(utc("2024-03-03T16:00:00Z"))
        );
        assert_eq!(parse_manila_local("not-a-date"), None);
        assert_eq!(parse_manila_local(""), None);
    }

    #[test]
    fn day_key_parsing() {
        assert_eq!(
            parse_day_key("2024-03-04"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
        assert_eq!(parse_day_key("2024-3-4x"), None);
        assert_eq!(parse_day_key(""), None);
    }

    #[test]
    fn grace_boundary_is_strict() {
        let on_time = from_manila_parts(2024, 3, 4, 8, 15, 0).unwrap();
        let late = from_manila_parts(2024, 3, 4, 8, 16, 0).unwrap();
        assert!(!is_late_in_manila(on_time, 8, 15));
        assert!(is_late_in_manila(late, 8, 15));
    }

    #[test]
    fn utc_noon_rendering_stays_on_the_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(date_at_utc_noon(day), utc("2024-03-04T12:00:00Z"));
    }
}
