//! Column filters and the predicate engine that applies them.
//!
//! A `FilterSet` carries at most one filter per column. Applying it is a
//! pure pass over the records: the known-wallet exclusion runs first, then
//! every remaining record must satisfy all filters (conjunction). A record
//! that lacks a filtered column skips that filter rather than being
//! excluded; unknown operators never reject anything.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::known::KnownWalletStore;
use crate::normalize::{normalize, NormalValue};
use crate::record::{RawValue, Record};
use crate::TARGET_FILTER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    /// Operator strings persisted by other versions of the tool that this
    /// one does not recognize. Evaluates as always-satisfied.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOp::Eq => "eq",
            FilterOp::Gt => "gt",
            FilterOp::Lt => "lt",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
            FilterOp::Contains => "contains",
            FilterOp::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" => Ok(FilterOp::Eq),
            "gt" => Ok(FilterOp::Gt),
            "lt" => Ok(FilterOp::Lt),
            "gte" => Ok(FilterOp::Gte),
            "lte" => Ok(FilterOp::Lte),
            "contains" => Ok(FilterOp::Contains),
            other => Err(format!(
                "unknown operator '{}' (expected eq, gt, lt, gte, lte or contains)",
                other
            )),
        }
    }
}

/// A single column condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub operator: FilterOp,
    pub value: RawValue,
}

/// The active set of column filters, at most one per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(flatten)]
    filters: HashMap<String, Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter for a column, replacing any previous one.
    pub fn set(&mut self, column: impl Into<String>, operator: FilterOp, value: impl Into<RawValue>) {
        self.filters.insert(
            column.into(),
            Filter {
                operator,
                value: value.into(),
            },
        );
    }

    pub fn remove(&mut self, column: &str) -> bool {
        self.filters.remove(column).is_some()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, column: &str) -> Option<&Filter> {
        self.filters.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Filter)> {
        self.filters.iter()
    }
}

/// Apply the known-wallet exclusion pass and then the column filters,
/// preserving record order. Pure: reads only the store's in-memory cache,
/// so running it again after the store finishes initializing simply
/// produces a superseding result.
pub fn apply(
    records: &[Record],
    filters: &FilterSet,
    exclude_known: bool,
    known: &KnownWalletStore,
) -> Vec<Record> {
    let mut result: Vec<Record> = if exclude_known {
        records
            .iter()
            .filter(|record| !record.wallet().map_or(false, |w| known.is_known(w)))
            .cloned()
            .collect()
    } else {
        records.to_vec()
    };

    if exclude_known {
        debug!(
            target: TARGET_FILTER,
            "Known-wallet pass kept {} of {} records",
            result.len(),
            records.len()
        );
    }

    if filters.is_empty() {
        return result;
    }

    let before = result.len();
    result.retain(|record| record_passes(record, filters));
    debug!(
        target: TARGET_FILTER,
        "{} column filters kept {} of {} records",
        filters.len(),
        result.len(),
        before
    );

    result
}

/// True when the record satisfies every filter in the set.
pub fn record_passes(record: &Record, filters: &FilterSet) -> bool {
    filters
        .iter()
        .all(|(column, filter)| filter_satisfied(record, column, filter))
}

fn filter_satisfied(record: &Record, column: &str, filter: &Filter) -> bool {
    // A record without the filtered column skips this filter entirely.
    let raw = match record.get(column) {
        Some(raw) => raw,
        None => return true,
    };

    let value = normalize(raw);
    let target = normalize(&filter.value);

    match filter.operator {
        FilterOp::Eq => value.loose_eq(&target),
        FilterOp::Gt => matches!(value.compare(&target), Some(std::cmp::Ordering::Greater)),
        FilterOp::Lt => matches!(value.compare(&target), Some(std::cmp::Ordering::Less)),
        FilterOp::Gte => matches!(
            value.compare(&target),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        FilterOp::Lte => matches!(
            value.compare(&target),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        FilterOp::Contains => match value.as_text() {
            Some(text) => {
                // The target side coerces to text so `contains 5` still
                // matches "a5b"; a non-text record value cannot contain
                // anything and fails the filter.
                let needle = match &target {
                    NormalValue::Text(s) => s.clone(),
                    NormalValue::Number(_) | NormalValue::Date(_) => filter.value.to_string(),
                };
                text.to_lowercase().contains(&needle.to_lowercase())
            }
            None => false,
        },
        FilterOp::Unknown => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn records() -> Vec<Record> {
        vec![
            [("ROI", RawValue::Number(0.8))].into_iter().collect(),
            [("ROI", RawValue::Number(0.3))].into_iter().collect(),
            [("other", RawValue::Number(1.0))].into_iter().collect(),
        ]
    }

    fn store() -> KnownWalletStore {
        // Never initialized: the empty cache excludes nothing, which is
        // exactly the documented pre-initialization behavior.
        KnownWalletStore::new("sqlite::memory:")
    }

    #[test]
    fn test_missing_column_skips_filter() {
        let mut filters = FilterSet::new();
        filters.set("ROI", FilterOp::Gt, 0.5);

        let result = apply(&records(), &filters, false, &store());
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].get("ROI"), Some(&RawValue::Number(0.8)));
        // The record without an ROI column passes the filter.
        assert_eq!(result[1].get("other"), Some(&RawValue::Number(1.0)));
    }

    #[test]
    fn test_empty_filter_set_is_identity() {
        let input = records();
        let result = apply(&input, &FilterSet::new(), false, &store());
        assert_eq!(result, input);
    }

    #[test]
    fn test_filters_are_a_conjunction() {
        let mut record = Record::new();
        record.set("ROI", 0.8);
        record.set("WR", 0.4);

        let mut filters = FilterSet::new();
        filters.set("ROI", FilterOp::Gt, 0.5);
        filters.set("WR", FilterOp::Gte, 0.5);
        assert!(!record_passes(&record, &filters));

        filters.set("WR", FilterOp::Gte, 0.4);
        assert!(record_passes(&record, &filters));
    }

    #[test]
    fn test_result_preserves_order_and_subset() {
        let input = records();
        let mut filters = FilterSet::new();
        filters.set("ROI", FilterOp::Lte, 0.8);

        let result = apply(&input, &filters, false, &store());
        assert!(result.len() <= input.len());
        let mut last_seen = 0;
        for record in &result {
            let idx = input.iter().position(|r| r == record).unwrap();
            assert!(idx >= last_seen);
            last_seen = idx;
        }
    }

    #[test]
    fn test_eq_is_loose_across_representations() {
        let mut record = Record::new();
        record.set("Mcap", "1.2k");

        let mut filters = FilterSet::new();
        filters.set("Mcap", FilterOp::Eq, 1200.0);
        assert!(record_passes(&record, &filters));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let mut record = Record::new();
        record.set("Tag", "Early Sniper");

        let mut filters = FilterSet::new();
        filters.set("Tag", FilterOp::Contains, "sniper");
        assert!(record_passes(&record, &filters));

        // A numeric cell cannot contain anything.
        let mut numeric = Record::new();
        numeric.set("Tag", 42.0);
        assert!(!record_passes(&numeric, &filters));
    }

    #[test]
    fn test_incomparable_operands_reject() {
        let mut record = Record::new();
        record.set("ROI", "not a number");

        let mut filters = FilterSet::new();
        filters.set("ROI", FilterOp::Gt, 0.5);
        assert!(!record_passes(&record, &filters));
    }

    #[test]
    fn test_unknown_operator_is_vacuous() {
        // An operator persisted by a newer version deserializes to Unknown
        // and must not exclude anything.
        let filter: Filter =
            serde_json::from_str(r#"{"operator": "regex", "value": ".*"}"#).unwrap();
        assert_eq!(filter.operator, FilterOp::Unknown);

        let mut filters = FilterSet::new();
        filters.set("ROI", filter.operator, filter.value);
        let result = apply(&records(), &filters, false, &store());
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_duration_strings_compare_numerically() {
        let mut record = Record::new();
        record.set("AVG Trade Duration", "2 hours");

        let mut filters = FilterSet::new();
        filters.set("AVG Trade Duration", FilterOp::Gt, "90 minutes");
        assert!(record_passes(&record, &filters));
    }

    #[test]
    fn test_set_replaces_existing_filter() {
        let mut filters = FilterSet::new();
        filters.set("ROI", FilterOp::Gt, 0.5);
        filters.set("ROI", FilterOp::Lt, 0.2);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("ROI").unwrap().operator, FilterOp::Lt);

        assert!(filters.remove("ROI"));
        assert!(!filters.remove("ROI"));
        assert!(filters.is_empty());
    }
}
