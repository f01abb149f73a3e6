//! Streaming column profiler

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::ProfileConfig;
use crate::error::{ProfileError, ProfileResult};
use crate::shape::ShapeAggregator;
use crate::sketch::{Extremes, FrequencyTable, Moments};

/// Scalar counts of a column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleCounts {
    /// Every tracked value, including nulls and blanks
    pub total: u64,
    /// Values that are neither null nor blank
    pub samples: u64,
    pub nulls: u64,
    /// Values made only of whitespace
    pub blanks: u64,
    /// Samples the value domain could not parse
    pub invalid: u64,
    /// Shortest sample, in characters
    pub min_length: Option<usize>,
    /// Longest sample, in characters
    pub max_length: Option<usize>,
}

impl SampleCounts {
    /// Sum the counts and widen the length bounds
    pub fn merge(&self, other: &SampleCounts) -> SampleCounts {
        SampleCounts {
            total: self.total.saturating_add(other.total),
            samples: self.samples.saturating_add(other.samples),
            nulls: self.nulls.saturating_add(other.nulls),
            blanks: self.blanks.saturating_add(other.blanks),
            invalid: self.invalid.saturating_add(other.invalid),
            min_length: min_option(self.min_length, other.min_length),
            max_length: self.max_length.max(other.max_length),
        }
    }

    fn record_length(&mut self, length: usize) {
        self.min_length = min_option(self.min_length, Some(length));
        self.max_length = self.max_length.max(Some(length));
    }
}

fn min_option(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Whether a profile still describes every value it was fed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Exactness {
    /// No cap was crossed
    Exact,
    /// The shape cap or the cardinality cap was crossed
    Capped,
}

/// Accumulates the shape, extremes, frequencies and counts of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfiler {
    pub(crate) config: ProfileConfig,
    pub(crate) counts: SampleCounts,
    pub(crate) shapes: ShapeAggregator,
    pub(crate) extremes: Extremes,
    pub(crate) frequencies: FrequencyTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) moments: Option<Moments>,
}

impl ColumnProfiler {
    /// Create a profiler; the configuration is validated first
    pub fn new(config: ProfileConfig) -> ProfileResult<Self> {
        config.validate()?;
        Ok(Self {
            counts: SampleCounts::default(),
            shapes: ShapeAggregator::with_settings(config.shape_settings())?,
            extremes: Extremes::new(config.domain, config.top_bottom_k)?,
            frequencies: FrequencyTable::new(config.max_cardinality)?,
            moments: config.domain.is_numeric().then(Moments::new),
            config,
        })
    }

    /// Track one value; `None` is a null
    pub fn track(&mut self, sample: Option<&str>) {
        self.track_weighted(sample, 1);
    }

    /// Track `weight` occurrences of one value
    pub fn track_weighted(&mut self, sample: Option<&str>, weight: u64) {
        if weight == 0 {
            return;
        }
        self.counts.total = self.counts.total.saturating_add(weight);

        let Some(sample) = sample else {
            self.counts.nulls = self.counts.nulls.saturating_add(weight);
            return;
        };
        if sample.trim().is_empty() {
            self.counts.blanks = self.counts.blanks.saturating_add(weight);
            return;
        }

        self.counts.samples = self.counts.samples.saturating_add(weight);
        self.counts.record_length(sample.chars().count());
        self.shapes.track(sample, weight);
        self.frequencies.record(sample, weight);

        let parsed = self.config.domain.parse(
            sample,
            &self.config.date_format,
            &self.config.datetime_format,
        );
        match parsed {
            Some(value) => {
                if let (Some(moments), Some(number)) = (self.moments.as_mut(), value.as_f64()) {
                    moments.record_weighted(number, weight);
                }
                self.extremes.observe(value, sample);
            }
            None => {
                trace!(domain = %self.config.domain, sample, "Sample rejected by value domain");
                self.counts.invalid = self.counts.invalid.saturating_add(weight);
            }
        }
    }

    /// Track every value of an iterator
    pub fn track_all<I, S>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        for sample in samples {
            self.track(sample.as_ref().map(AsRef::as_ref));
        }
    }

    /// Regex describing every retained shape
    pub fn regexp(&self, tightened: bool) -> String {
        self.shapes.regexp(tightened)
    }

    /// Check a sample against the tightened shape pattern
    pub fn matches(&self, sample: &str) -> ProfileResult<bool> {
        self.shapes.matches(sample)
    }

    /// Text of the smallest values, ascending
    pub fn bottom_k(&self) -> Vec<&str> {
        self.extremes.bottom_k_strings()
    }

    /// Text of the largest values, descending
    pub fn top_k(&self) -> Vec<&str> {
        self.extremes.top_k_strings()
    }

    pub fn min(&self) -> Option<&str> {
        self.extremes.min_text()
    }

    pub fn max(&self) -> Option<&str> {
        self.extremes.max_text()
    }

    pub fn exactness(&self) -> Exactness {
        if self.shapes.is_overflowed() || !self.frequencies.is_exact() {
            Exactness::Capped
        } else {
            Exactness::Exact
        }
    }

    pub fn is_exact(&self) -> bool {
        self.exactness() == Exactness::Exact
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn counts(&self) -> &SampleCounts {
        &self.counts
    }

    pub fn shapes(&self) -> &ShapeAggregator {
        &self.shapes
    }

    pub fn extremes(&self) -> &Extremes {
        &self.extremes
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    /// Mean and variance; only kept for numeric domains
    pub fn moments(&self) -> Option<&Moments> {
        self.moments.as_ref()
    }

    /// Check that the components agree with the configuration
    pub(crate) fn check_consistency(&self) -> ProfileResult<()> {
        self.config.validate()?;
        let inconsistent = |what: &str| {
            Err(ProfileError::InvalidConfig(format!(
                "{what} does not match the profile configuration"
            )))
        };
        if *self.shapes.settings() != self.config.shape_settings() {
            return inconsistent("shape settings");
        }
        if self.extremes.domain() != self.config.domain
            || self.extremes.capacity() != self.config.top_bottom_k
        {
            return inconsistent("extremal sketch");
        }
        if self.frequencies.max_cardinality() != self.config.max_cardinality {
            return inconsistent("frequency table");
        }
        if self.moments.is_some() != self.config.domain.is_numeric() {
            return inconsistent("moments");
        }
        Ok(())
    }
}
