//! Bounded distinct-value counter

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProfileError, ProfileResult};

/// Default cap on distinct values counted
pub const DEFAULT_MAX_CARDINALITY: usize = 12_000;

/// Occurrence counts per distinct value, holding at most `max_cardinality` values
///
/// Once full, unseen values are no longer admitted and the table is flagged as
/// capped; counts of values already held stay exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyTable {
    max_cardinality: usize,
    counts: BTreeMap<String, u64>,
    total: u64,
    capped: bool,
}

impl FrequencyTable {
    pub fn new(max_cardinality: usize) -> ProfileResult<Self> {
        if max_cardinality == 0 {
            return Err(ProfileError::InvalidConfig(
                "maxCardinality must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_cardinality,
            counts: BTreeMap::new(),
            total: 0,
            capped: false,
        })
    }

    /// Count `weight` occurrences of `value`
    pub fn record(&mut self, value: &str, weight: u64) {
        if weight == 0 {
            return;
        }
        self.total = self.total.saturating_add(weight);

        if let Some(count) = self.counts.get_mut(value) {
            *count = count.saturating_add(weight);
        } else if self.counts.len() < self.max_cardinality {
            self.counts.insert(value.to_string(), weight);
        } else if !self.capped {
            debug!(
                max_cardinality = self.max_cardinality,
                "Cardinality cap reached, distinct counts are now approximate"
            );
            self.capped = true;
        }
    }

    /// Number of distinct values held
    pub fn distinct_count(&self) -> usize {
        self.counts.len()
    }

    /// Occurrences of all values, held or not
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Occurrences of `value`; zero when it is not held
    pub fn count(&self, value: &str) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Returns true while every distinct value seen is held
    pub fn is_exact(&self) -> bool {
        !self.capped
    }

    pub fn max_cardinality(&self) -> usize {
        self.max_cardinality
    }

    /// The `n` most frequent values, by descending count then ascending value
    pub fn most_frequent(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(value, &count)| (value.as_str(), count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }

    /// Combine two tables
    ///
    /// Counts of shared values add up. If the union holds more distinct values
    /// than the cap, the smallest values are kept and the result is capped.
    pub fn merge(&self, other: &FrequencyTable) -> ProfileResult<FrequencyTable> {
        if self.max_cardinality != other.max_cardinality {
            return Err(ProfileError::IncompatibleMerge {
                setting: "maxCardinality",
                left: self.max_cardinality.to_string(),
                right: other.max_cardinality.to_string(),
            });
        }

        let mut counts = self.counts.clone();
        for (value, count) in &other.counts {
            let merged = counts.entry(value.clone()).or_insert(0);
            *merged = merged.saturating_add(*count);
        }

        let mut capped = self.capped || other.capped;
        if counts.len() > self.max_cardinality {
            capped = true;
            while counts.len() > self.max_cardinality {
                counts.pop_last();
            }
        }

        Ok(FrequencyTable {
            max_cardinality: self.max_cardinality,
            counts,
            total: self.total.saturating_add(other.total),
            capped,
        })
    }
}
