//! Configuration for column profiling

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};
use crate::shape::{
    DEFAULT_LENGTH_ALTERNATION_LIMIT, DEFAULT_MAX_SAMPLE_LENGTH, DEFAULT_MAX_SHAPES, ShapeSettings,
};
use crate::sketch::{
    DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, DEFAULT_MAX_CARDINALITY, DEFAULT_TOP_BOTTOM_K,
    ValueDomain,
};

/// Configuration for a column profiler
///
/// Profiles can only be merged when they were built under identical
/// configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileConfig {
    /// Domain used to order values for the extremal sketch
    pub domain: ValueDomain,

    /// Maximum distinct shapes before the shape pattern degrades to `.+`
    pub max_shapes: usize,

    /// Number of smallest and largest values kept
    pub top_bottom_k: usize,

    /// Samples longer than this many characters are not profiled structurally
    pub max_sample_length: usize,

    /// Distinct run lengths rendered as an alternation before collapsing
    /// to a `{min,max}` range
    pub length_alternation_limit: usize,

    /// Maximum distinct values counted exactly
    pub max_cardinality: usize,

    /// Fold a shape and its one-group extension into `prefix(suffix)?`
    pub fold_optional_suffixes: bool,

    /// chrono format for the date domain
    pub date_format: String,

    /// chrono format for the date-time domain
    pub datetime_format: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            domain: ValueDomain::Text,
            max_shapes: DEFAULT_MAX_SHAPES,
            top_bottom_k: DEFAULT_TOP_BOTTOM_K,
            max_sample_length: DEFAULT_MAX_SAMPLE_LENGTH,
            length_alternation_limit: DEFAULT_LENGTH_ALTERNATION_LIMIT,
            max_cardinality: DEFAULT_MAX_CARDINALITY,
            fold_optional_suffixes: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

impl ProfileConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> ProfileConfigBuilder {
        ProfileConfigBuilder::default()
    }

    /// Settings handed to the shape aggregator
    pub fn shape_settings(&self) -> ShapeSettings {
        ShapeSettings {
            max_shapes: self.max_shapes,
            max_sample_length: self.max_sample_length,
            length_alternation_limit: self.length_alternation_limit,
            fold_optional_suffixes: self.fold_optional_suffixes,
        }
    }

    /// Check that every capacity is positive and the date formats parse
    pub fn validate(&self) -> ProfileResult<()> {
        self.shape_settings().validate()?;

        if self.top_bottom_k == 0 {
            return Err(ProfileError::InvalidConfig(
                "topBottomK must be greater than zero".to_string(),
            ));
        }
        if self.max_cardinality == 0 {
            return Err(ProfileError::InvalidConfig(
                "maxCardinality must be greater than zero".to_string(),
            ));
        }

        for (name, format) in [
            ("dateFormat", &self.date_format),
            ("datetimeFormat", &self.datetime_format),
        ] {
            if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(ProfileError::InvalidConfig(format!(
                    "{name} is not a valid format: {format:?}"
                )));
            }
        }

        Ok(())
    }

    /// Fail with the first setting that differs between two configurations
    pub fn check_compatible(&self, other: &ProfileConfig) -> ProfileResult<()> {
        if self.domain != other.domain {
            return Err(ProfileError::IncompatibleMerge {
                setting: "domain",
                left: self.domain.to_string(),
                right: other.domain.to_string(),
            });
        }

        self.shape_settings().check_compatible(&other.shape_settings())?;

        let scalars = [
            ("topBottomK", self.top_bottom_k, other.top_bottom_k),
            ("maxCardinality", self.max_cardinality, other.max_cardinality),
        ];
        for (setting, left, right) in scalars {
            if left != right {
                return Err(ProfileError::IncompatibleMerge {
                    setting,
                    left: left.to_string(),
                    right: right.to_string(),
                });
            }
        }

        let formats = [
            ("dateFormat", &self.date_format, &other.date_format),
            ("datetimeFormat", &self.datetime_format, &other.datetime_format),
        ];
        for (setting, left, right) in formats {
            if left != right {
                return Err(ProfileError::IncompatibleMerge {
                    setting,
                    left: left.clone(),
                    right: right.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Builder for ProfileConfig
#[derive(Debug, Default)]
pub struct ProfileConfigBuilder {
    config: ProfileConfig,
}

impl ProfileConfigBuilder {
    /// Set the value domain
    pub fn domain(mut self, domain: ValueDomain) -> Self {
        self.config.domain = domain;
        self
    }

    /// Set the distinct shape cap
    pub fn max_shapes(mut self, max: usize) -> Self {
        self.config.max_shapes = max;
        self
    }

    /// Set K for the extremal sketch
    pub fn top_bottom_k(mut self, k: usize) -> Self {
        self.config.top_bottom_k = k;
        self
    }

    /// Set the longest sample profiled structurally
    pub fn max_sample_length(mut self, length: usize) -> Self {
        self.config.max_sample_length = length;
        self
    }

    /// Set the run length alternation limit
    pub fn length_alternation_limit(mut self, limit: usize) -> Self {
        self.config.length_alternation_limit = limit;
        self
    }

    /// Set the distinct value cap
    pub fn max_cardinality(mut self, max: usize) -> Self {
        self.config.max_cardinality = max;
        self
    }

    /// Enable or disable optional suffix folding
    pub fn fold_optional_suffixes(mut self, fold: bool) -> Self {
        self.config.fold_optional_suffixes = fold;
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.date_format = format.into();
        self
    }

    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.config.datetime_format = format.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> ProfileConfig {
        self.config
    }
}
