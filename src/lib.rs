//! Data Profiling Core - Streaming column profiles that merge across shards
//!
//! Provides:
//! - Shape inference: a compact regular expression describing a text column
//! - Exact top/bottom-K tracking over text, numeric and temporal domains
//! - Bounded frequency tables and numeric moments
//! - Shard merging with an explicit exact/capped flag
//! - Versioned JSON/YAML snapshots

pub mod config;
pub mod error;
pub mod profile;
mod serde_pairs;
pub mod shape;
pub mod sketch;

pub use config::{ProfileConfig, ProfileConfigBuilder};
pub use error::{ProfileError, ProfileResult};
pub use profile::{ColumnProfiler, Exactness, SNAPSHOT_VERSION, SampleCounts, merge_profiles};
pub use shape::{ShapeAggregator, ShapeKey, ShapeModel, ShapeSettings, classify};
pub use sketch::{Extremes, FrequencyTable, Moments, RealKey, TopBottomK, ValueDomain};
