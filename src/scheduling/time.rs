use once_cell::sync::Lazy;
use regex::Regex;
use time::OffsetDateTime;

use crate::error::AppError;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)(?::([0-5]\d))?$").expect("valid regex"));

/// Parses a wall-clock time string ("HH:MM" or "HH:MM:SS") into minutes
/// since midnight. Seconds are accepted and discarded.
pub fn to_minutes(value: &str) -> Result<i16, AppError> {
    let captures = TIME_RE
        .captures(value)
        .ok_or_else(|| AppError::Validation(format!("time format must be HH:MM, got '{value}'")))?;

    // The regex guarantees both groups are present and numeric.
    let hours: i16 = captures[1].parse().unwrap_or(0);
    let minutes: i16 = captures[2].parse().unwrap_or(0);

    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight back into "HH:MM".
pub fn format_minutes(minutes: i16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Half-open interval overlap test. Intervals sharing only an endpoint do
/// not overlap; an exact duplicate does.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// True when `[inner_start, inner_end)` lies fully within
/// `[outer_start, outer_end)`, endpoints included.
pub fn contains<T: PartialOrd>(outer_start: T, outer_end: T, inner_start: T, inner_end: T) -> bool {
    outer_start <= inner_start && outer_end >= inner_end
}

/// Day of week for a timestamp, 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(at: OffsetDateTime) -> i16 {
    i16::from(at.weekday().number_days_from_sunday())
}

/// Minute-of-day component of a timestamp.
pub fn minute_of_day(at: OffsetDateTime) -> i16 {
    i16::from(at.hour()) * 60 + i16::from(at.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_hour_minute() {
        assert_eq!(to_minutes("09:00").unwrap(), 540);
        assert_eq!(to_minutes("9:05").unwrap(), 545);
        assert_eq!(to_minutes("00:00").unwrap(), 0);
        assert_eq!(to_minutes("23:59").unwrap(), 1439);
    }

    #[test]
    fn parses_and_discards_seconds() {
        assert_eq!(to_minutes("14:30:45").unwrap(), 870);
        assert_eq!(to_minutes("14:30:00").unwrap(), 870);
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["24:00", "12:60", "12", "12:3", "ab:cd", "12:30:", "-1:00", ""] {
            assert!(to_minutes(bad).is_err(), "expected '{bad}' to be rejected");
        }
    }

    #[test]
    fn format_round_trips() {
        assert_eq!(format_minutes(540), "09:00");
        assert_eq!(format_minutes(0), "00:00");
        assert_eq!(format_minutes(1439), "23:59");
        assert_eq!(to_minutes(&format_minutes(615)).unwrap(), 615);
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [(540, 600, 570, 630), (540, 600, 600, 660), (540, 600, 540, 600)];
        for (a, b, c, d) in cases {
            assert_eq!(overlaps(a, b, c, d), overlaps(c, d, a, b));
        }
    }

    #[test]
    fn adjacent_intervals_do_not_overlap() {
        assert!(!overlaps(540, 600, 600, 660));
        assert!(!overlaps(600, 660, 540, 600));
    }

    #[test]
    fn duplicate_interval_overlaps() {
        assert!(overlaps(540, 600, 540, 600));
    }

    #[test]
    fn partial_and_containing_intervals_overlap() {
        assert!(overlaps(540, 600, 570, 630));
        assert!(overlaps(540, 660, 570, 600));
        assert!(overlaps(570, 600, 540, 660));
    }

    #[test]
    fn containment_includes_endpoints() {
        assert!(contains(540, 660, 540, 660));
        assert!(contains(540, 660, 555, 585));
        assert!(!contains(540, 660, 530, 585));
        assert!(!contains(540, 660, 555, 675));
    }

    #[test]
    fn day_of_week_is_sunday_based() {
        // 2024-01-07 was a Sunday, 2024-01-08 a Monday.
        assert_eq!(day_of_week(datetime!(2024-01-07 12:00 UTC)), 0);
        assert_eq!(day_of_week(datetime!(2024-01-08 12:00 UTC)), 1);
        assert_eq!(day_of_week(datetime!(2024-01-13 12:00 UTC)), 6);
    }

    #[test]
    fn minute_of_day_matches_wall_clock() {
        assert_eq!(minute_of_day(datetime!(2024-01-08 09:15 UTC)), 555);
        assert_eq!(minute_of_day(datetime!(2024-01-08 00:00 UTC)), 0);
    }
}
