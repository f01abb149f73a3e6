//! Column profiles and shard merging
//!
//! A [`ColumnProfiler`] feeds every sample of a column through the shape
//! aggregator, the extremal sketch, the frequency table and, for numeric
//! domains, the moment accumulator. Profiles built on different shards merge
//! into one and round trip through versioned snapshots.
//!
//! ## Example
//!
//! ```rust
//! use data_profiling_core::{ColumnProfiler, ProfileConfig, ValueDomain, merge_profiles};
//!
//! let config = ProfileConfig::builder().domain(ValueDomain::Integer).build();
//!
//! let mut left = ColumnProfiler::new(config.clone())?;
//! left.track_all([Some("100"), None, Some("7")]);
//!
//! let mut right = ColumnProfiler::new(config)?;
//! right.track_all([Some("200"), Some(" ")]);
//!
//! let merged = merge_profiles(&[left, right])?.expect("two shards");
//! assert_eq!(merged.counts().nulls, 1);
//! assert_eq!(merged.min(), Some("7"));
//! assert_eq!(merged.max(), Some("200"));
//! assert!(merged.is_exact());
//! # Ok::<(), data_profiling_core::ProfileError>(())
//! ```

mod merge;
mod profiler;
mod snapshot;

pub use merge::merge_profiles;
pub use profiler::{ColumnProfiler, Exactness, SampleCounts};
pub use snapshot::SNAPSHOT_VERSION;
