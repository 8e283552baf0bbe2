//! Converts heterogeneous cell values into comparable scalars.
//!
//! Imported sheets mix plain numbers with magnitude-suffixed strings
//! ("6.2k"), duration phrases ("2 hours"), and timestamp fragments
//! ("Mar 15 10:30:00"). Everything here is lossy-but-total: a value that
//! matches no known pattern passes through unchanged, and parsing never
//! fails outward.

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use tracing::debug;

use crate::record::RawValue;
use crate::TARGET_NORMALIZE;

/// Fallback when a duration cell is missing or unreadable.
pub const DEFAULT_DURATION_MINUTES: f64 = 60.0;

lazy_static! {
    static ref MAGNITUDE_RE: Regex = Regex::new(r"(?i)^(\d+(?:\.\d+)?)([km])?$").unwrap();
    static ref DATE_RE: Regex =
        Regex::new(r"(?i)^[a-z]{3} \d{1,2} \d{1,2}:\d{2}:\d{2}$").unwrap();
    static ref LEADING_NUMBER_RE: Regex = Regex::new(r"^\s*(\d+(?:\.\d+)?)").unwrap();
}

/// A cell value reduced to its comparable form.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalValue {
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl NormalValue {
    /// Loose equality in the spirit of the source data: numbers compare
    /// numerically, text compares exactly, and mixed kinds never match.
    pub fn loose_eq(&self, other: &NormalValue) -> bool {
        match (self, other) {
            (NormalValue::Number(a), NormalValue::Number(b)) => a == b,
            (NormalValue::Date(a), NormalValue::Date(b)) => a == b,
            (NormalValue::Text(a), NormalValue::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering for the relational filter operators. Numbers order
    /// numerically, dates temporally, text lexicographically; mixed
    /// kinds are incomparable.
    pub fn compare(&self, other: &NormalValue) -> Option<Ordering> {
        match (self, other) {
            (NormalValue::Number(a), NormalValue::Number(b)) => a.partial_cmp(b),
            (NormalValue::Date(a), NormalValue::Date(b)) => Some(a.cmp(b)),
            (NormalValue::Text(a), NormalValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Normalize a raw cell for comparison. Numbers stay numbers; strings are
/// promoted to numbers (magnitude suffix or duration phrase) or dates when
/// they match a known pattern, and pass through unchanged otherwise.
pub fn normalize(raw: &RawValue) -> NormalValue {
    match raw {
        RawValue::Number(n) => NormalValue::Number(*n),
        RawValue::Text(s) => normalize_text(s),
    }
}

fn normalize_text(s: &str) -> NormalValue {
    let trimmed = s.trim();

    if let Some(caps) = MAGNITUDE_RE.captures(trimmed) {
        if let Ok(num) = caps[1].parse::<f64>() {
            return NormalValue::Number(apply_suffix(num, caps.get(2).map(|m| m.as_str())));
        }
    }

    if is_duration(trimmed) {
        return NormalValue::Number(duration_to_minutes(Some(trimmed)));
    }

    if DATE_RE.is_match(trimmed) {
        if let Some(date) = parse_month_day_time(trimmed) {
            return NormalValue::Date(date);
        }
        debug!(
            target: TARGET_NORMALIZE,
            "Date-like value '{}' did not parse, treating as text", trimmed
        );
    }

    NormalValue::Text(s.to_string())
}

fn apply_suffix(num: f64, suffix: Option<&str>) -> f64 {
    match suffix.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("k") => num * 1_000.0,
        Some("m") => num * 1_000_000.0,
        _ => num,
    }
}

/// Parse a magnitude-suffixed string ("6.2k", "1.5m", "42") into a number.
/// Anything that does not match the pattern yields 0.
pub fn parse_magnitude(value: &str) -> f64 {
    match MAGNITUDE_RE.captures(value.trim()) {
        Some(caps) => match caps[1].parse::<f64>() {
            Ok(num) => apply_suffix(num, caps.get(2).map(|m| m.as_str())),
            Err(_) => 0.0,
        },
        None => {
            debug!(
                target: TARGET_NORMALIZE,
                "Value '{}' is not a magnitude, defaulting to 0", value
            );
            0.0
        }
    }
}

fn is_duration(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.contains("minute") || lower.contains("hour") || lower.contains("day")
}

/// Convert a duration phrase ("45 minutes", "2 hours", "an hour", "a day")
/// into minutes. Missing or unreadable input falls back to 60 minutes.
pub fn duration_to_minutes(duration: Option<&str>) -> f64 {
    let text = match duration {
        Some(s) if !s.trim().is_empty() => s.trim().to_ascii_lowercase(),
        _ => return DEFAULT_DURATION_MINUTES,
    };

    // "an hour" / "a day" style phrases count as one unit.
    let count = if text.starts_with("an ") || text.starts_with("a ") {
        Some(1.0)
    } else {
        LEADING_NUMBER_RE
            .captures(&text)
            .and_then(|caps| caps[1].parse::<f64>().ok())
    };

    if text.contains("minute") {
        return count.unwrap_or(DEFAULT_DURATION_MINUTES);
    }
    if text.contains("hour") {
        return count.map(|n| n * 60.0).unwrap_or(DEFAULT_DURATION_MINUTES);
    }
    if text.contains("day") {
        return count
            .map(|n| n * 60.0 * 24.0)
            .unwrap_or(DEFAULT_DURATION_MINUTES);
    }

    // No unit: a bare number is taken as minutes already.
    match count {
        Some(n) => n,
        None => {
            debug!(
                target: TARGET_NORMALIZE,
                "Duration '{}' is unreadable, defaulting to {} minutes",
                text,
                DEFAULT_DURATION_MINUTES
            );
            DEFAULT_DURATION_MINUTES
        }
    }
}

/// Parse a "Mon dd hh:mm:ss" fragment. The source sheets omit the year, so
/// a fixed one is substituted; the result is only ever used for ordering
/// within one import.
fn parse_month_day_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("2000 {}", s), "%Y %b %d %H:%M:%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_suffixes() {
        assert_eq!(parse_magnitude("1.2k"), 1200.0);
        assert_eq!(parse_magnitude("1.5m"), 1_500_000.0);
        assert_eq!(parse_magnitude("6.2K"), 6200.0);
        assert_eq!(parse_magnitude("42"), 42.0);
        assert_eq!(parse_magnitude("not a number"), 0.0);
        assert_eq!(parse_magnitude("12k extra"), 0.0);
    }

    #[test]
    fn test_duration_to_minutes() {
        assert_eq!(duration_to_minutes(Some("45 minutes")), 45.0);
        assert_eq!(duration_to_minutes(Some("1 minute")), 1.0);
        assert_eq!(duration_to_minutes(Some("2 hours")), 120.0);
        assert_eq!(duration_to_minutes(Some("an hour")), 60.0);
        assert_eq!(duration_to_minutes(Some("a day")), 1440.0);
        assert_eq!(duration_to_minutes(Some("3 days")), 4320.0);
        assert_eq!(duration_to_minutes(None), 60.0);
        assert_eq!(duration_to_minutes(Some("")), 60.0);
        assert_eq!(duration_to_minutes(Some("soon")), 60.0);
        // A bare number is already minutes.
        assert_eq!(duration_to_minutes(Some("15")), 15.0);
    }

    #[test]
    fn test_normalize_promotes_strings() {
        assert_eq!(
            normalize(&RawValue::Text("6.2k".into())),
            NormalValue::Number(6200.0)
        );
        assert_eq!(
            normalize(&RawValue::Text("30 minutes".into())),
            NormalValue::Number(30.0)
        );
        assert_eq!(normalize(&RawValue::Number(0.8)), NormalValue::Number(0.8));
        // Unrecognized strings pass through unchanged.
        assert_eq!(
            normalize(&RawValue::Text("HODLer".into())),
            NormalValue::Text("HODLer".to_string())
        );
    }

    #[test]
    fn test_date_ordering() {
        let a = normalize(&RawValue::Text("Mar 15 10:30:00".into()));
        let b = normalize(&RawValue::Text("Mar 16 09:00:00".into()));
        assert!(matches!(a, NormalValue::Date(_)));
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }

    #[test]
    fn test_loose_eq_and_compare() {
        let n = NormalValue::Number(1200.0);
        assert!(n.loose_eq(&normalize(&RawValue::Text("1.2k".into()))));
        assert!(!n.loose_eq(&NormalValue::Text("1200".to_string())));

        // Mixed kinds are incomparable.
        assert_eq!(
            NormalValue::Text("abc".to_string()).compare(&NormalValue::Number(1.0)),
            None
        );
        assert_eq!(
            NormalValue::Text("alpha".to_string())
                .compare(&NormalValue::Text("beta".to_string())),
            Some(Ordering::Less)
        );
    }
}
