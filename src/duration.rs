//! Duration parsing for timedelta-formatted telemetry fields.
//!
//! Lap times and session offsets are exported as `"0 days 00:01:23.456000"`,
//! as bare clock strings (`"00:01:23.456"`) or as raw seconds. Every form is
//! reduced to seconds as `f64`. Anything that does not parse is missing
//! (`None`), never zero and never an error.

use chrono::TimeDelta;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// A value that can be read as a duration in seconds.
pub trait DurationValue {
    fn to_seconds(&self) -> Option<f64>;
}

impl DurationValue for str {
    fn to_seconds(&self) -> Option<f64> {
        let text = self.trim();
        if text.is_empty() {
            return None;
        }
        if !text.contains(':') {
            return text.parse::<f64>().ok().and_then(|s| s.to_seconds());
        }
        let delta = parse_timedelta(text)?;
        Some(delta.num_microseconds()? as f64 / MICROS_PER_SECOND)
    }
}

impl DurationValue for String {
    fn to_seconds(&self) -> Option<f64> {
        self.as_str().to_seconds()
    }
}

impl DurationValue for f64 {
    fn to_seconds(&self) -> Option<f64> {
        (self.is_finite() && *self >= 0.0).then_some(*self)
    }
}

impl<T: DurationValue> DurationValue for Option<T> {
    fn to_seconds(&self) -> Option<f64> {
        self.as_ref().and_then(DurationValue::to_seconds)
    }
}

impl<T: DurationValue + ?Sized> DurationValue for &T {
    fn to_seconds(&self) -> Option<f64> {
        (**self).to_seconds()
    }
}

/// Parses a duration into seconds, returning `None` for empty or malformed input.
///
/// ```
/// use lap_events::duration::parse;
///
/// assert_eq!(parse("0 days 00:01:23.456000"), Some(83.456));
/// assert_eq!(parse(45.2), Some(45.2));
/// assert_eq!(parse(""), None);
/// ```
pub fn parse(value: impl DurationValue) -> Option<f64> {
    value.to_seconds()
}

/// Parses `[D days] H:MM:SS[.ffffff]` into a [`TimeDelta`].
///
/// The fractional part may have any number of digits; anything past
/// microsecond precision is truncated.
pub fn parse_timedelta(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (days, clock) = split_days(text)?;

    let (hms, fraction) = match clock.split_once('.') {
        Some((hms, fraction)) => (hms, Some(fraction)),
        None => (clock, None),
    };

    let mut fields = hms.split(':');
    let hours = parse_digits(fields.next()?)?;
    let minutes = parse_digits(fields.next()?)?;
    let seconds = parse_digits(fields.next()?)?;
    if fields.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    let micros = match fraction {
        Some(fraction) => parse_fraction(fraction)?,
        None => 0,
    };

    let whole = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes * 60 + seconds)?;

    TimeDelta::try_seconds(whole)?.checked_add(&TimeDelta::microseconds(micros))
}

fn split_days(text: &str) -> Option<(i64, &str)> {
    let Some((count, rest)) = text.split_once(' ') else {
        return Some((0, text));
    };
    let clock = rest
        .strip_prefix("days")
        .or_else(|| rest.strip_prefix("day"))?
        .trim_start();
    Some((parse_digits(count)?, clock))
}

fn parse_digits(field: &str) -> Option<i64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_fraction(fraction: &str) -> Option<i64> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut digits: String = fraction.chars().take(6).collect();
    while digits.len() < 6 {
        digits.push('0');
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days_prefixed_lap_time() {
        assert_eq!(parse("0 days 00:01:23.456000"), Some(83.456));
    }

    #[test]
    fn test_parse_raw_seconds() {
        assert_eq!(parse(45.2), Some(45.2));
        assert_eq!(parse("45.2"), Some(45.2));
    }

    #[test]
    fn test_parse_empty_is_missing() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse(None::<&str>), None);
    }

    #[test]
    fn test_parse_without_fraction() {
        assert_eq!(parse("0 days 01:00:05"), Some(3605.0));
        assert_eq!(parse("00:00:10"), Some(10.0));
    }

    #[test]
    fn test_parse_multiple_days() {
        assert_eq!(parse("2 days 00:00:01"), Some(172_801.0));
        assert_eq!(parse("1 day 00:00:00.5"), Some(86_400.5));
    }

    #[test]
    fn test_parse_truncates_to_microseconds() {
        assert_eq!(parse("00:00:01.123456789"), Some(1.123456));
    }

    #[test]
    fn test_parse_malformed_is_missing() {
        for text in [
            "NaT",
            "abc",
            "0 days",
            "0 weeks 00:00:01",
            "00:61:00",
            "00:00:75",
            "1:2",
            "00:00:01.",
            "00:00:01.12a",
            "-00:00:01",
            "-3.0",
            "nan",
            "inf",
        ] {
            assert_eq!(parse(text), None, "{text:?} should be missing");
        }
    }

    #[test]
    fn test_parse_nan_seconds_is_missing() {
        assert_eq!(parse(f64::NAN), None);
        assert_eq!(parse(f64::INFINITY), None);
    }

    #[test]
    fn test_parse_timedelta_components() {
        let delta = parse_timedelta("1 days 02:03:04.000005").unwrap();
        assert_eq!(delta.num_days(), 1);
        assert_eq!(
            delta.num_microseconds(),
            Some(((86_400 + 2 * 3_600 + 3 * 60 + 4) * 1_000_000) + 5)
        );
    }
}
