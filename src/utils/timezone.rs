//! Stored times are UTC. Presentation converts them to one fixed zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Formats a UTC instant in the given zone, e.g. `2024-03-01 15:30:00 +07:00`.
pub fn to_display(utc: DateTime<Utc>, zone: FixedOffset) -> String {
    utc.with_timezone(&zone).format(DISPLAY_FORMAT).to_string()
}

/// Attendance rows keep a UTC date and a UTC time of day; this rebuilds the instant.
pub fn combine_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

/// Accepts `Z`, `+07:00`, `+0700`, `-05:30` and `+7`.
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn converts_to_positive_offset() {
        let zone = parse_offset("+07:00").unwrap();
        assert_eq!(
            to_display(utc(2024, 3, 1, 8, 30), zone),
            "2024-03-01 15:30:00 +07:00"
        );
    }

    #[test]
    fn conversion_can_move_to_next_day() {
        let zone = parse_offset("+07:00").unwrap();
        assert_eq!(
            to_display(utc(2024, 12, 31, 20, 0), zone),
            "2025-01-01 03:00:00 +07:00"
        );
    }

    #[test]
    fn conversion_can_move_to_previous_day() {
        let zone = parse_offset("-05:30").unwrap();
        assert_eq!(
            to_display(utc(2024, 3, 1, 2, 0), zone),
            "2024-02-29 20:30:00 -05:30"
        );
    }

    #[test]
    fn utc_zone_is_identity() {
        let zone = parse_offset("Z").unwrap();
        assert_eq!(
            to_display(utc(2024, 3, 1, 9, 5), zone),
            "2024-03-01 09:05:00 +00:00"
        );
    }

    #[test]
    fn combine_builds_utc_instant() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let time = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
        assert_eq!(combine_utc(date, time), utc(2024, 5, 10, 9, 15));
    }

    #[test]
    fn offset_formats() {
        assert_eq!(parse_offset("+0700").unwrap().local_minus_utc(), 25_200);
        assert_eq!(parse_offset("+7").unwrap().local_minus_utc(), 25_200);
        assert_eq!(parse_offset("-05:30").unwrap().local_minus_utc(), -19_800);
        assert_eq!(parse_offset("utc").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn invalid_offsets_are_rejected() {
        assert!(parse_offset("").is_none());
        assert!(parse_offset("07:00").is_none());
        assert!(parse_offset("+25:00").is_none());
        assert!(parse_offset("+07:75").is_none());
        assert!(parse_offset("Asia/Bangkok").is_none());
        assert!(parse_offset("+").is_none());
    }

    #[test]
    fn multibyte_offsets_are_rejected_without_panicking() {
        assert!(parse_offset("+aé1").is_none());
        assert!(parse_offset("+0é").is_none());
        assert!(parse_offset("-é:00").is_none());
    }
}
