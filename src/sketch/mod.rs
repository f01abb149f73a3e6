//! Bounded value sketches
//!
//! Exact summaries that hold a bounded amount of state and merge across
//! shards:
//!
//! - **Top/bottom-K** - The K smallest and largest distinct values, over any ordered key
//! - **Moments** - Count, mean and variance with Chan's parallel merge
//! - **Frequencies** - Per-value occurrence counts up to a cardinality cap
//! - **Domains** - Parse samples as text, integers, reals, dates or date-times

mod domain;
mod extremal;
mod frequency;
mod moments;

pub use domain::{
    DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, Extremes, ParsedValue, RealKey, ValueDomain,
};
pub use extremal::{DEFAULT_TOP_BOTTOM_K, TopBottomK};
pub use frequency::{DEFAULT_MAX_CARDINALITY, FrequencyTable};
pub use moments::Moments;
