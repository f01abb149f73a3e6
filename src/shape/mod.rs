//! Shape inference for text samples
//!
//! This module discovers a compact regular expression describing a stream of
//! strings without supervision.
//!
//! ## Features
//!
//! - **Classification** - Split a sample into digit, alphabetic and literal runs
//! - **Range algebra** - Track observed characters per position as coalesced intervals
//! - **Clustering** - Group samples by shape with lengths erased, under a hard cap
//! - **Suffix folding** - Render `12345` and `12345-6789` as `\d{5}(-\d{4})?`
//! - **Merging** - Combine aggregators built on different shards exactly
//!
//! ## Example
//!
//! ```rust
//! use data_profiling_core::shape::ShapeAggregator;
//!
//! let mut aggregator = ShapeAggregator::new(100)?;
//! aggregator.track("16789", 1);
//! aggregator.track("01338", 1);
//! aggregator.track("22457", 1);
//!
//! assert_eq!(aggregator.regexp(false), r"\d{5}");
//! assert_eq!(aggregator.regexp(true), "[0-2][1-26][3-47][358][7-9]");
//! # Ok::<(), data_profiling_core::ProfileError>(())
//! ```

mod aggregator;
mod model;
mod pattern;
mod ranges;

pub use aggregator::{DEFAULT_MAX_SHAPES, ShapeAggregator, ShapeCluster, ShapeSettings};
pub use model::{
    CompressedKey, DEFAULT_MAX_SAMPLE_LENGTH, Run, RunClass, RunProfile, ShapeKey, ShapeModel,
    classify,
};
pub use pattern::{
    ALPHA_CLASS, CATCH_ALL, DEFAULT_LENGTH_ALTERNATION_LIMIT, DIGIT_CLASS, MATCH_EVERYTHING, escape,
};
pub use ranges::CharRanges;
