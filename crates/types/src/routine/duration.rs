//! Duration strings such as `500ms`, `20s`, or `1m30s`.
//!
//! A duration is a sequence of decimal numbers, each with an optional fraction and a unit
//! suffix. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m`, and `h`. A bare `0` is
//! accepted; any other number must carry a unit.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SEGMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("duration segment regex should compile"));

/// Error surfaced when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,
    #[error("invalid duration \"{0}\"")]
    Invalid(String),
    #[error("duration \"{0}\" is out of range")]
    OutOfRange(String),
}

/// Parse a duration string into a [`Duration`].
pub fn parse_duration(raw: &str) -> Result<Duration, DurationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DurationError::Empty);
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut remaining = text;
    let mut total_nanos = 0f64;
    while !remaining.is_empty() {
        let captures = SEGMENT_PATTERN
            .captures(remaining)
            .ok_or_else(|| DurationError::Invalid(raw.to_string()))?;
        let amount: f64 = captures[1].parse().map_err(|_| DurationError::Invalid(raw.to_string()))?;
        let unit = unit_nanos(&captures[2]).ok_or_else(|| DurationError::Invalid(raw.to_string()))?;
        total_nanos += amount * unit;
        remaining = &remaining[captures[0].len()..];
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(DurationError::OutOfRange(raw.to_string()));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(1e3),
        "ms" => Some(1e6),
        "s" => Some(1e9),
        "m" => Some(60e9),
        "h" => Some(3600e9),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_compound_units() {
        assert_eq!(parse_duration("20s"), Ok(Duration::from_secs(20)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10m"), Ok(Duration::from_secs(600)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn rejects_missing_units_and_garbage() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("20"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("soon"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("-5s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse_duration("5s later"), Err(DurationError::Invalid(_))));
    }
}
