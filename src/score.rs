//! Strategy scoring over a single record.
//!
//! Three weighted combinations of normalized trading features. The
//! calculation is total: a missing or unreadable cell contributes a zero
//! feature, and every final score is clamped into [0, 1].

use serde::{Deserialize, Serialize};

use crate::normalize::{duration_to_minutes, parse_magnitude};
use crate::record::{RawValue, Record};

// Normalization ceilings assumed by the formulas.
const MAX_PNL: f64 = 100.0;
const MAX_PF_TOKENS: f64 = 100.0;
const MAX_MCAP_GROWTH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyScores {
    pub aggressive: f64,
    pub conservative: f64,
    pub universal: f64,
}

/// Compute the three strategy scores for a record. Never fails.
pub fn calculate_scores(record: &Record) -> StrategyScores {
    let roi = numeric_field(record, "ROI");
    let median_roi = numeric_field(record, "Median ROI");
    let pnl_norm = (numeric_field(record, "PNL") / MAX_PNL).clamp(0.0, 1.0);
    let rockets = numeric_field(record, "Rockets");
    let win_rate = numeric_field(record, "WR");

    let avg_duration = trade_duration_minutes(record);
    let duration_factor = if avg_duration > 0.0 {
        1.0 / avg_duration
    } else {
        0.0
    };

    let pf_tokens_score =
        (numeric_field(record, "PF Tokens").trunc() / MAX_PF_TOKENS).clamp(0.0, 1.0);
    let mcap_growth = mcap_growth(record);

    let aggressive = roi * 0.35 + pnl_norm * 0.3 + rockets * 0.2 + duration_factor * 0.15;
    let conservative =
        median_roi * 0.4 + rockets * 0.3 + pf_tokens_score * 0.2 + mcap_growth * 0.1;
    let universal = roi * 0.25
        + median_roi * 0.2
        + rockets * 0.2
        + mcap_growth * 0.15
        + duration_factor * 0.1
        + win_rate * 0.1;

    StrategyScores {
        aggressive: aggressive.clamp(0.0, 1.0),
        conservative: conservative.clamp(0.0, 1.0),
        universal: universal.clamp(0.0, 1.0),
    }
}

/// Market-cap growth from first to last transaction, against an assumed
/// 10x ceiling. Zero when the first observation is missing or non-positive.
fn mcap_growth(record: &Record) -> f64 {
    let first = magnitude_field(record, "AVG Mcap First Tx");
    let last = magnitude_field(record, "AVG Mcap Last Tx");

    if first <= 0.0 {
        return 0.0;
    }

    let growth = (last - first) / first;
    (growth / MAX_MCAP_GROWTH).clamp(0.0, 1.0)
}

fn numeric_field(record: &Record, column: &str) -> f64 {
    match record.get(column) {
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    }
}

fn magnitude_field(record: &Record, column: &str) -> f64 {
    match record.get(column) {
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(s)) => parse_magnitude(s),
        None => 0.0,
    }
}

fn trade_duration_minutes(record: &Record) -> f64 {
    match record.get("AVG Trade Duration") {
        Some(RawValue::Number(n)) => *n,
        Some(RawValue::Text(s)) => duration_to_minutes(Some(s)),
        None => duration_to_minutes(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        [
            ("ROI", RawValue::Number(0.8)),
            ("Median ROI", RawValue::Number(0.5)),
            ("PNL", RawValue::Number(50.0)),
            ("Rockets", RawValue::Number(0.6)),
            ("WR", RawValue::Number(0.7)),
            ("AVG Trade Duration", RawValue::Text("2 hours".into())),
            ("PF Tokens", RawValue::Number(40.0)),
            ("AVG Mcap First Tx", RawValue::Text("6.2k".into())),
            ("AVG Mcap Last Tx", RawValue::Text("75.3k".into())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_scores_for_sample_record() {
        let record = sample_record();
        let scores = calculate_scores(&record);

        let duration_factor = 1.0 / 120.0;
        let mcap_growth: f64 = (((75_300.0 - 6_200.0) / 6_200.0) / 10.0_f64).clamp(0.0, 1.0);

        let aggressive = 0.8 * 0.35 + 0.5 * 0.3 + 0.6 * 0.2 + duration_factor * 0.15;
        let conservative = 0.5 * 0.4 + 0.6 * 0.3 + 0.4 * 0.2 + mcap_growth * 0.1;
        let universal = 0.8 * 0.25
            + 0.5 * 0.2
            + 0.6 * 0.2
            + mcap_growth * 0.15
            + duration_factor * 0.1
            + 0.7 * 0.1;

        assert!((scores.aggressive - aggressive).abs() < 1e-9);
        assert!((scores.conservative - conservative).abs() < 1e-9);
        assert!((scores.universal - universal).abs() < 1e-9);
    }

    #[test]
    fn test_scores_are_clamped_for_extreme_inputs() {
        let record: Record = [
            ("ROI", RawValue::Number(1000.0)),
            ("Median ROI", RawValue::Number(500.0)),
            ("PNL", RawValue::Number(10_000.0)),
            ("Rockets", RawValue::Number(99.0)),
            ("WR", RawValue::Number(5.0)),
        ]
        .into_iter()
        .collect();

        let scores = calculate_scores(&record);
        assert_eq!(scores.aggressive, 1.0);
        assert_eq!(scores.conservative, 1.0);
        assert_eq!(scores.universal, 1.0);
    }

    #[test]
    fn test_empty_record_scores_from_defaults_only() {
        // Every feature is zero except the duration factor, which falls
        // back to the 60-minute default.
        let scores = calculate_scores(&Record::new());
        let duration_factor = 1.0 / 60.0;
        assert!((scores.aggressive - duration_factor * 0.15).abs() < 1e-9);
        assert_eq!(scores.conservative, 0.0);
        assert!((scores.universal - duration_factor * 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_first_mcap_is_zero_growth() {
        let mut record = Record::new();
        record.set("AVG Mcap First Tx", 0.0);
        record.set("AVG Mcap Last Tx", "75.3k");
        assert_eq!(mcap_growth(&record), 0.0);
    }

    #[test]
    fn test_unreadable_cells_default_to_zero() {
        let mut record = Record::new();
        record.set("ROI", "n/a");
        record.set("PF Tokens", "many");
        let scores = calculate_scores(&record);
        assert_eq!(scores.conservative, 0.0);
    }
}
