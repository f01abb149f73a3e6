//! Shard merging
//!
//! Combines column profiles built independently on partitions of the same
//! column. Inputs are borrowed and never modified; the result is a fresh
//! profile equal to what one profiler would have built from all samples, as
//! long as no cap was crossed.

use tracing::debug;

use super::profiler::ColumnProfiler;
use crate::error::ProfileResult;

impl ColumnProfiler {
    /// Merge two profiles of the same column
    ///
    /// Fails with [`crate::ProfileError::IncompatibleMerge`] when the
    /// profiles were built under different configurations.
    pub fn merge(&self, other: &ColumnProfiler) -> ProfileResult<ColumnProfiler> {
        self.config.check_compatible(&other.config)?;

        let moments = match (self.moments, other.moments) {
            (Some(left), Some(right)) => Some(left.merge(&right)),
            (left, right) => left.or(right),
        };

        let merged = ColumnProfiler {
            config: self.config.clone(),
            counts: self.counts.merge(&other.counts),
            shapes: self.shapes.merge(&other.shapes)?,
            extremes: self.extremes.merge(&other.extremes)?,
            frequencies: self.frequencies.merge(&other.frequencies)?,
            moments,
        };

        debug!(
            left_total = self.counts.total,
            right_total = other.counts.total,
            clusters = merged.shapes.cluster_count(),
            exactness = ?merged.exactness(),
            "Merged column profiles"
        );
        Ok(merged)
    }
}

/// Merge any number of profiles with a balanced pairwise reduction
///
/// Returns `None` for an empty slice.
pub fn merge_profiles(profiles: &[ColumnProfiler]) -> ProfileResult<Option<ColumnProfiler>> {
    if profiles.is_empty() {
        return Ok(None);
    }
    reduce(profiles).map(Some)
}

fn reduce(profiles: &[ColumnProfiler]) -> ProfileResult<ColumnProfiler> {
    match profiles {
        [single] => Ok(single.clone()),
        _ => {
            let (left, right) = profiles.split_at(profiles.len() / 2);
            reduce(left)?.merge(&reduce(right)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::error::ProfileError;
    use crate::profile::Exactness;
    use crate::sketch::ValueDomain;

    fn build(config: &ProfileConfig, samples: &[Option<&str>]) -> ColumnProfiler {
        let mut profiler = ColumnProfiler::new(config.clone()).unwrap();
        profiler.track_all(samples.iter().copied());
        profiler
    }

    #[test]
    fn test_merge_equals_direct_for_text() {
        let config = ProfileConfig::default();
        let left = [Some("AB-12"), None, Some("CD-7")];
        let right = [Some(" "), Some("AB-12"), Some("x")];
        let all: Vec<_> = left.iter().chain(right.iter()).copied().collect();

        let merged = build(&config, &left).merge(&build(&config, &right)).unwrap();
        assert_eq!(merged, build(&config, &all));
    }

    #[test]
    fn test_merge_sums_moments() {
        let config = ProfileConfig::builder().domain(ValueDomain::Real).build();
        let left = build(&config, &[Some("1.5"), Some("2.5")]);
        let right = build(&config, &[Some("5")]);

        let merged = left.merge(&right).unwrap();
        let moments = merged.moments().unwrap();
        assert_eq!(moments.count(), 3);
        assert!((moments.mean().unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(merged.max(), Some("5"));
    }

    #[test]
    fn test_merge_rejects_different_configs() {
        let left = build(&ProfileConfig::default(), &[Some("1")]);
        let right = build(&ProfileConfig::builder().max_shapes(5).build(), &[Some("1")]);
        assert!(matches!(
            left.merge(&right),
            Err(ProfileError::IncompatibleMerge { setting: "maxShapes", .. })
        ));
    }

    #[test]
    fn test_merge_crossing_cap_is_capped() {
        let config = ProfileConfig::builder().max_shapes(1).build();
        let left = build(&config, &[Some("12")]);
        let right = build(&config, &[Some("ab")]);
        assert!(left.is_exact() && right.is_exact());

        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.exactness(), Exactness::Capped);
        assert_eq!(merged.regexp(true), ".+");
    }

    #[test]
    fn test_merge_profiles_tree() {
        let config = ProfileConfig::builder().domain(ValueDomain::Integer).build();
        let shards: Vec<ColumnProfiler> = (0..5)
            .map(|i| {
                let values: Vec<String> = (i * 10..i * 10 + 10).map(|v| v.to_string()).collect();
                let mut profiler = ColumnProfiler::new(config.clone()).unwrap();
                profiler.track_all(values.iter().map(|v| Some(v.as_str())));
                profiler
            })
            .collect();

        let merged = merge_profiles(&shards).unwrap().unwrap();
        assert_eq!(merged.counts().samples, 50);
        assert_eq!(merged.min(), Some("0"));
        assert_eq!(merged.max(), Some("49"));
        assert_eq!(merged.top_k()[..3], ["49", "48", "47"]);
        assert!(merge_profiles(&[]).unwrap().is_none());
    }
}
