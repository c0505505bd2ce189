//! Named pure functions for timestamp decomposition and the
//! duration-rounding join key. All wall-clock derivation uses UTC so a run
//! produces the same tables regardless of host timezone.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};

use crate::error::EtlError;

/// Calendar decomposition of one event timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockParts {
    pub hour: i16,
    pub day: i16,
    pub week_of_year: i16,
    pub month: i32,
    pub year: i32,
    pub weekday: Weekday,
}

/// Decompose an epoch-milliseconds timestamp into its UTC calendar parts.
pub fn clock_parts(epoch_ms: i64) -> Result<ClockParts, EtlError> {
    let datetime: DateTime<Utc> = Utc
        .timestamp_millis_opt(epoch_ms)
        .single()
        .ok_or_else(|| EtlError::MalformedRecord {
            message: format!("timestamp out of range: {}", epoch_ms),
        })?;

    Ok(ClockParts {
        hour: datetime.hour() as i16,
        day: datetime.day() as i16,
        week_of_year: datetime.iso_week().week() as i16,
        month: datetime.month() as i32,
        year: datetime.year(),
        weekday: datetime.weekday(),
    })
}

/// Saturday and Sunday count as weekend. The weekday value is evaluated,
/// not just tested for presence.
pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Truncate a duration in seconds to whole seconds. Used as the join key
/// between event `length` and catalog `duration`, which disagree by
/// sub-second jitter for the same song; truncation maps 137.44 and 137.9
/// to the same key.
pub fn whole_secs(seconds: f64) -> i64 {
    seconds.trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2018-11-03T05:00:00Z, a Saturday in ISO week 44.
    const SATURDAY_MS: i64 = 1_541_203_200_000 + 5 * 3600 * 1000;
    // 2018-11-06T00:00:00Z, a Tuesday.
    const TUESDAY_MS: i64 = 1_541_462_400_000;

    #[test]
    fn decomposes_utc_calendar_parts() {
        let parts = clock_parts(SATURDAY_MS).unwrap();
        assert_eq!(parts.hour, 5);
        assert_eq!(parts.day, 3);
        assert_eq!(parts.week_of_year, 44);
        assert_eq!(parts.month, 11);
        assert_eq!(parts.year, 2018);
        assert_eq!(parts.weekday, Weekday::Sat);
    }

    #[test]
    fn weekend_flag_uses_the_weekday_value() {
        assert!(is_weekend(clock_parts(SATURDAY_MS).unwrap().weekday));
        assert!(is_weekend(Weekday::Sun));
        assert!(!is_weekend(clock_parts(TUESDAY_MS).unwrap().weekday));
    }

    #[test]
    fn duration_key_truncates_to_whole_seconds() {
        assert_eq!(whole_secs(137.44), 137);
        assert_eq!(whole_secs(137.9), 137);
        assert_eq!(whole_secs(138.01), 138);
        assert_eq!(whole_secs(0.0), 0);
    }

    #[test]
    fn out_of_range_timestamp_is_malformed() {
        assert!(clock_parts(i64::MAX).is_err());
    }
}
