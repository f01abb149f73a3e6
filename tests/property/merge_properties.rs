use data_profiling_core::{
    ColumnProfiler, ProfileConfig, ShapeAggregator, ShapeSettings, TopBottomK,
};
use proptest::prelude::*;

fn structured_sample() -> impl Strategy<Value = String> {
    "[a-c0-9.-]{0,8}"
}

fn variable_run() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{1,6}", "[a-zA-Z]{1,6}"]
}

fn render(sample: &str) -> String {
    aggregate(400, &[sample.to_string()]).regexp(false)
}

fn aggregate(max_shapes: usize, samples: &[String]) -> ShapeAggregator {
    let mut aggregator = ShapeAggregator::new(max_shapes).unwrap();
    for sample in samples {
        aggregator.track(sample, 1);
    }
    aggregator
}

fn profile(config: &ProfileConfig, samples: &[Option<String>]) -> ColumnProfiler {
    let mut profiler = ColumnProfiler::new(config.clone()).unwrap();
    profiler.track_all(samples.iter().map(|s| s.as_deref()));
    profiler
}

proptest! {
    #[test]
    fn shape_state_is_order_independent(
        (samples, shuffled) in prop::collection::vec(structured_sample(), 0..30)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let direct = aggregate(400, &samples);
        let permuted = aggregate(400, &shuffled);
        prop_assert_eq!(direct.regexp(true), permuted.regexp(true));
        prop_assert_eq!(direct, permuted);
    }

    #[test]
    fn shape_merge_equals_direct_under_any_cap(
        samples in prop::collection::vec(structured_sample(), 0..40),
        split in 0usize..40,
        max_shapes in 1usize..12,
    ) {
        let split = split.min(samples.len());
        let (left, right) = samples.split_at(split);
        let merged = aggregate(max_shapes, left).merge(&aggregate(max_shapes, right)).unwrap();
        let direct = aggregate(max_shapes, &samples);
        prop_assert_eq!(merged.is_overflowed(), direct.is_overflowed());
        prop_assert_eq!(merged, direct);
    }

    #[test]
    fn profile_merge_is_associative(
        samples in prop::collection::vec(prop::option::of(structured_sample()), 0..45),
        first in 0usize..45,
        second in 0usize..45,
    ) {
        let config = ProfileConfig::builder().max_shapes(25).top_bottom_k(4).build();
        let (lo, hi) = (first.min(second).min(samples.len()), first.max(second).min(samples.len()));
        let (a, b, c) = (&samples[..lo], &samples[lo..hi], &samples[hi..]);
        let (pa, pb, pc) = (profile(&config, a), profile(&config, b), profile(&config, c));

        let left_first = pa.merge(&pb).unwrap().merge(&pc).unwrap();
        let right_first = pa.merge(&pb.merge(&pc).unwrap()).unwrap();
        let direct = profile(&config, &samples);

        prop_assert_eq!(&left_first, &right_first);
        prop_assert_eq!(&left_first, &direct);
        prop_assert_eq!(left_first.exactness(), direct.exactness());
    }

    #[test]
    fn sketch_is_exact(
        values in prop::collection::vec(-50i64..50, 0..60),
        k in 1usize..8,
        split in 0usize..60,
    ) {
        let mut distinct = values.clone();
        distinct.sort_unstable();
        distinct.dedup();
        let expected_bottom: Vec<i64> = distinct.iter().copied().take(k).collect();
        let expected_top: Vec<i64> = distinct.iter().rev().copied().take(k).collect();

        let build = |part: &[i64]| {
            let mut sketch = TopBottomK::new(k).unwrap();
            for &v in part {
                sketch.observe(v);
            }
            sketch
        };
        let direct = build(&values);
        prop_assert_eq!(direct.bottom_k(), expected_bottom);
        prop_assert_eq!(direct.top_k(), expected_top);

        let (left, right) = values.split_at(split.min(values.len()));
        prop_assert_eq!(build(left).merge(&build(right)).unwrap(), direct);
    }

    #[test]
    fn tracked_samples_always_match(samples in prop::collection::vec(".{0,12}", 1..20)) {
        let aggregator = aggregate(400, &samples);
        for sample in &samples {
            prop_assert!(
                aggregator.matches(sample).unwrap(),
                "{:?} not matched by {}",
                sample,
                aggregator.regexp(true)
            );
        }
    }

    #[test]
    fn regexp_is_deterministic(samples in prop::collection::vec(structured_sample(), 0..25)) {
        let first = aggregate(10, &samples);
        let second = aggregate(10, &samples);
        prop_assert_eq!(first.regexp(false), second.regexp(false));
        prop_assert_eq!(first.regexp(true), second.regexp(true));
    }

    #[test]
    fn optional_suffix_folds_only_one_literal_and_one_run_past_the_base(
        base in "[0-9]{1,6}",
        prefix in variable_run(),
        separator in "[-./_:]{1,2}",
        suffix in variable_run(),
        fold in any::<bool>(),
    ) {
        let extended = format!("{prefix}{separator}{suffix}");
        let settings = ShapeSettings {
            fold_optional_suffixes: fold,
            ..ShapeSettings::default()
        };
        let mut aggregator = ShapeAggregator::with_settings(settings).unwrap();
        aggregator.track(&base, 1);
        aggregator.track(&extended, 1);

        let qualifies = prefix.bytes().all(|b| b.is_ascii_digit())
            && prefix.len() == base.len()
            && separator.len() == 1;

        let expected = if fold && qualifies {
            format!("{}({})?", render(&base), render(&format!("{separator}{suffix}")))
        } else {
            let mut alternatives = [render(&base), render(&extended)];
            alternatives.sort();
            format!("({}|{})", alternatives[0], alternatives[1])
        };
        prop_assert_eq!(aggregator.regexp(false), expected);

        for sample in [&base, &extended] {
            prop_assert!(
                aggregator.matches(sample).unwrap(),
                "{:?} not matched by {}",
                sample,
                aggregator.regexp(true)
            );
        }
    }
}
