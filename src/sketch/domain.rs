//! Value domains for extremal tracking
//!
//! A domain decides how a sample is parsed into an ordered key: lexical for
//! text, numeric for integers and reals, chronological for dates. The
//! extremal sketch itself stays generic over the key type.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::extremal::TopBottomK;
use crate::error::{ProfileError, ProfileResult};

/// Default chrono format for the date domain
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default chrono format for the date-time domain
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Semantic domain of a column's values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueDomain {
    /// Lexical order of the raw text
    #[default]
    Text,
    /// Signed 64-bit integers
    Integer,
    /// Finite floating point numbers
    Real,
    /// Calendar dates
    Date,
    /// Dates with a time of day, no zone
    DateTime,
}

impl ValueDomain {
    /// Returns true for domains that also feed moment statistics
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueDomain::Integer | ValueDomain::Real)
    }

    /// Parse a sample into a key of this domain
    ///
    /// Numeric and temporal domains ignore surrounding whitespace. Returns
    /// `None` when the sample does not belong to the domain.
    pub fn parse(&self, sample: &str, date_format: &str, datetime_format: &str) -> Option<ParsedValue> {
        let trimmed = sample.trim();
        match self {
            ValueDomain::Text => Some(ParsedValue::Text(sample.to_string())),
            ValueDomain::Integer => trimmed.parse::<i64>().ok().map(ParsedValue::Integer),
            ValueDomain::Real => trimmed
                .parse::<f64>()
                .ok()
                .and_then(RealKey::new)
                .map(ParsedValue::Real),
            ValueDomain::Date => NaiveDate::parse_from_str(trimmed, date_format)
                .ok()
                .map(ParsedValue::Date),
            ValueDomain::DateTime => NaiveDateTime::parse_from_str(trimmed, datetime_format)
                .ok()
                .map(ParsedValue::DateTime),
        }
    }
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueDomain::Text => "text",
            ValueDomain::Integer => "integer",
            ValueDomain::Real => "real",
            ValueDomain::Date => "date",
            ValueDomain::DateTime => "dateTime",
        };
        write!(f, "{name}")
    }
}

/// Finite `f64` with a total order
///
/// Negative zero is normalized to zero so `-0` and `0` are one key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealKey(f64);

impl RealKey {
    /// Wrap a finite value; NaN and infinities are rejected
    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(RealKey(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for RealKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RealKey {}

impl PartialOrd for RealKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RealKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for RealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sample parsed into its domain key
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Text(String),
    Integer(i64),
    Real(RealKey),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl ParsedValue {
    /// Numeric value for moment statistics
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParsedValue::Integer(v) => Some(*v as f64),
            ParsedValue::Real(v) => Some(v.value()),
            _ => None,
        }
    }
}

/// Extremal sketch specialized to one value domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "sketch", rename_all = "camelCase")]
pub enum Extremes {
    Text(TopBottomK<String>),
    Integer(TopBottomK<i64>),
    Real(TopBottomK<RealKey>),
    Date(TopBottomK<NaiveDate>),
    DateTime(TopBottomK<NaiveDateTime>),
}

macro_rules! with_sketch {
    ($extremes:expr, $sketch:ident => $body:expr) => {
        match $extremes {
            Extremes::Text($sketch) => $body,
            Extremes::Integer($sketch) => $body,
            Extremes::Real($sketch) => $body,
            Extremes::Date($sketch) => $body,
            Extremes::DateTime($sketch) => $body,
        }
    };
}

impl Extremes {
    /// Create an empty sketch for `domain` holding `k` keys per side
    pub fn new(domain: ValueDomain, k: usize) -> ProfileResult<Self> {
        Ok(match domain {
            ValueDomain::Text => Extremes::Text(TopBottomK::new(k)?),
            ValueDomain::Integer => Extremes::Integer(TopBottomK::new(k)?),
            ValueDomain::Real => Extremes::Real(TopBottomK::new(k)?),
            ValueDomain::Date => Extremes::Date(TopBottomK::new(k)?),
            ValueDomain::DateTime => Extremes::DateTime(TopBottomK::new(k)?),
        })
    }

    pub fn domain(&self) -> ValueDomain {
        match self {
            Extremes::Text(_) => ValueDomain::Text,
            Extremes::Integer(_) => ValueDomain::Integer,
            Extremes::Real(_) => ValueDomain::Real,
            Extremes::Date(_) => ValueDomain::Date,
            Extremes::DateTime(_) => ValueDomain::DateTime,
        }
    }

    /// Observe a parsed value with the text it came from
    ///
    /// Values of another domain are ignored.
    pub fn observe(&mut self, value: ParsedValue, text: &str) {
        match (self, value) {
            (Extremes::Text(sketch), ParsedValue::Text(v)) => sketch.observe_with_text(v, text),
            (Extremes::Integer(sketch), ParsedValue::Integer(v)) => sketch.observe_with_text(v, text),
            (Extremes::Real(sketch), ParsedValue::Real(v)) => sketch.observe_with_text(v, text),
            (Extremes::Date(sketch), ParsedValue::Date(v)) => sketch.observe_with_text(v, text),
            (Extremes::DateTime(sketch), ParsedValue::DateTime(v)) => {
                sketch.observe_with_text(v, text)
            }
            _ => {}
        }
    }

    /// Text of the smallest values, ascending
    pub fn bottom_k_strings(&self) -> Vec<&str> {
        with_sketch!(self, sketch => sketch.bottom_k_strings())
    }

    /// Text of the largest values, descending
    pub fn top_k_strings(&self) -> Vec<&str> {
        with_sketch!(self, sketch => sketch.top_k_strings())
    }

    /// Text of the smallest value
    pub fn min_text(&self) -> Option<&str> {
        with_sketch!(self, sketch => sketch.min_text())
    }

    /// Text of the largest value
    pub fn max_text(&self) -> Option<&str> {
        with_sketch!(self, sketch => sketch.max_text())
    }

    pub fn capacity(&self) -> usize {
        with_sketch!(self, sketch => sketch.capacity())
    }

    pub fn is_empty(&self) -> bool {
        with_sketch!(self, sketch => sketch.is_empty())
    }

    /// Merge two sketches of the same domain
    pub fn merge(&self, other: &Extremes) -> ProfileResult<Extremes> {
        Ok(match (self, other) {
            (Extremes::Text(a), Extremes::Text(b)) => Extremes::Text(a.merge(b)?),
            (Extremes::Integer(a), Extremes::Integer(b)) => Extremes::Integer(a.merge(b)?),
            (Extremes::Real(a), Extremes::Real(b)) => Extremes::Real(a.merge(b)?),
            (Extremes::Date(a), Extremes::Date(b)) => Extremes::Date(a.merge(b)?),
            (Extremes::DateTime(a), Extremes::DateTime(b)) => Extremes::DateTime(a.merge(b)?),
            _ => {
                return Err(ProfileError::IncompatibleMerge {
                    setting: "domain",
                    left: self.domain().to_string(),
                    right: other.domain().to_string(),
                });
            }
        })
    }
}
