//! Shard merge tests

use data_profiling_core::{
    ColumnProfiler, Exactness, ProfileConfig, ProfileError, ValueDomain, merge_profiles,
};

/// Build one shard: `count` copies of `value` with a null every 10th row and
/// a blank every 25th
fn shard(config: &ProfileConfig, value: &str, count: usize) -> ColumnProfiler {
    let mut profiler = ColumnProfiler::new(config.clone()).unwrap();
    for i in 0..count {
        let sample = if i % 10 == 0 {
            None
        } else if i % 25 == 0 {
            Some("  ")
        } else {
            Some(value)
        };
        profiler.track(sample);
    }
    profiler
}

fn track(config: &ProfileConfig, samples: &[&str]) -> ColumnProfiler {
    let mut profiler = ColumnProfiler::new(config.clone()).unwrap();
    profiler.track_all(samples.iter().map(|s| Some(*s)));
    profiler
}

mod shard_merge_tests {
    use super::*;

    #[test]
    fn test_two_shards_of_constant_values() {
        let config = ProfileConfig::builder().domain(ValueDomain::Integer).build();
        let left = shard(&config, "100", 100);
        let right = shard(&config, "200", 100);

        let merged = left.merge(&right).unwrap();
        let counts = merged.counts();
        assert_eq!(counts.total, 200);
        assert_eq!(counts.nulls, left.counts().nulls + right.counts().nulls);
        assert_eq!(counts.blanks, left.counts().blanks + right.counts().blanks);
        assert_eq!(counts.samples, left.counts().samples + right.counts().samples);
        assert_eq!(counts.nulls, 20);
        assert_eq!(counts.blanks, 4);

        assert_eq!(merged.min(), Some("100"));
        assert_eq!(merged.max(), Some("200"));
        assert_eq!(merged.regexp(false), r"\d{3}");
        assert_eq!(merged.regexp(true), "[12]00");
        assert!(merged.is_exact());

        let moments = merged.moments().unwrap();
        assert_eq!(moments.count(), 176);
        assert!((moments.mean().unwrap() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_inputs_are_untouched() {
        let config = ProfileConfig::default();
        let left = track(&config, &["a-1", "b-2"]);
        let right = track(&config, &["c-3"]);
        let (left_before, right_before) = (left.clone(), right.clone());

        let _ = left.merge(&right).unwrap();
        assert_eq!(left, left_before);
        assert_eq!(right, right_before);
    }

    #[test]
    fn test_merge_is_associative_and_matches_direct() {
        let config = ProfileConfig::default();
        let a = ["AB-12", "CD-345", "x"];
        let b = ["12345", "AB-12", "q.r"];
        let c = ["12345-6789", "", "Zz"];

        let (pa, pb, pc) = (track(&config, &a), track(&config, &b), track(&config, &c));
        let left_first = pa.merge(&pb).unwrap().merge(&pc).unwrap();
        let right_first = pa.merge(&pb.merge(&pc).unwrap()).unwrap();

        let all: Vec<&str> = a.iter().chain(&b).chain(&c).copied().collect();
        let direct = track(&config, &all);

        assert_eq!(left_first, right_first);
        assert_eq!(left_first, direct);
        assert_eq!(left_first.regexp(true), direct.regexp(true));
    }

    #[test]
    fn test_merge_order_does_not_change_exactness() {
        let config = ProfileConfig::builder().max_shapes(2).build();
        let shards = [
            track(&config, &["1"]),
            track(&config, &["a"]),
            track(&config, &["-"]),
            track(&config, &["1", "a"]),
        ];

        let tree = merge_profiles(&shards).unwrap().unwrap();
        let mut sequential = shards[0].clone();
        for shard in &shards[1..] {
            sequential = sequential.merge(shard).unwrap();
        }

        assert_eq!(tree.exactness(), Exactness::Capped);
        assert_eq!(sequential.exactness(), Exactness::Capped);
        assert_eq!(tree, sequential);
        assert_eq!(tree.counts().total, 5);
    }

    #[test]
    fn test_cardinality_cap_marks_capped() {
        let config = ProfileConfig::builder().max_cardinality(3).build();
        let left = track(&config, &["a", "b"]);
        let right = track(&config, &["c", "d"]);

        let merged = left.merge(&right).unwrap();
        assert_eq!(merged.exactness(), Exactness::Capped);
        assert!(merged.shapes().is_exact());
        assert_eq!(merged.frequencies().distinct_count(), 3);
    }

    #[test]
    fn test_incompatible_merges_fail() {
        let base = ProfileConfig::default();
        let cases = [
            (ProfileConfig::builder().max_shapes(7).build(), "maxShapes"),
            (ProfileConfig::builder().top_bottom_k(3).build(), "topBottomK"),
            (ProfileConfig::builder().domain(ValueDomain::Real).build(), "domain"),
            (ProfileConfig::builder().max_cardinality(9).build(), "maxCardinality"),
            (
                ProfileConfig::builder().fold_optional_suffixes(false).build(),
                "foldOptionalSuffixes",
            ),
        ];

        let left = track(&base, &["1"]);
        for (config, expected) in cases {
            let right = track(&config, &["1"]);
            match left.merge(&right) {
                Err(ProfileError::IncompatibleMerge { setting, .. }) => {
                    assert_eq!(setting, expected)
                }
                other => panic!("expected incompatible merge on {expected}, got {other:?}"),
            }
        }
    }
}

mod snapshot_tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip_then_merge() {
        let config = ProfileConfig::builder().domain(ValueDomain::Integer).build();
        let left = shard(&config, "100", 50);
        let right = shard(&config, "200", 50);

        let left_back = ColumnProfiler::from_json(&left.to_json().unwrap()).unwrap();
        let right_back = ColumnProfiler::from_yaml(&right.to_yaml().unwrap()).unwrap();
        assert_eq!(left_back, left);
        assert_eq!(right_back, right);

        let merged = left_back.merge(&right_back).unwrap();
        assert_eq!(merged, left.merge(&right).unwrap());
    }

    #[test]
    fn test_overflowed_snapshot_round_trip() {
        let config = ProfileConfig::builder().max_shapes(1).build();
        let profile = track(&config, &["1", "a", "b"]);
        assert!(!profile.is_exact());

        let back = ColumnProfiler::from_json(&profile.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back.regexp(true), ".+");
        assert_eq!(back.exactness(), Exactness::Capped);
        assert_eq!(back.shapes().total_occurrences(), 3);
    }

    #[test]
    fn test_snapshot_is_versioned() {
        let json = track(&ProfileConfig::default(), &["x"]).to_json().unwrap();
        assert!(json.starts_with("{\"version\":1,"));
    }
}
