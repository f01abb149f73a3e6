//! Shape aggregation across a stream of samples
//!
//! Samples are clustered by compressed shape key. Each cluster keeps the exact
//! shape signatures it has absorbed together with per-run lengths and
//! observed character ranges. The number of distinct exact shapes is capped;
//! admitting one more switches the aggregator permanently to the catch-all
//! pattern.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{
    CompressedKey, DEFAULT_MAX_SAMPLE_LENGTH, RunClass, RunProfile, ShapeModel, render_runs,
};
use super::pattern::{CATCH_ALL, DEFAULT_LENGTH_ALTERNATION_LIMIT, MATCH_EVERYTHING};
use crate::error::{ProfileError, ProfileResult};

/// Default cap on distinct shapes
pub const DEFAULT_MAX_SHAPES: usize = 400;

const PATTERN_SIZE_LIMIT: usize = 1 << 26;

static CATCH_ALL_REGEX: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(&format!("^(?:{CATCH_ALL})$"))
        .dot_matches_new_line(true)
        .build()
        .unwrap()
});

/// Tunables of a shape aggregator
///
/// Two aggregators can only be merged when their settings are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSettings {
    /// Maximum distinct exact shapes retained before overflow
    pub max_shapes: usize,
    /// Samples longer than this many characters classify as the catch-all shape
    pub max_sample_length: usize,
    /// Distinct run lengths rendered as alternation before collapsing to `{min,max}`
    pub length_alternation_limit: usize,
    /// Render a cluster and its one-group extension as `prefix(suffix)?`
    pub fold_optional_suffixes: bool,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self {
            max_shapes: DEFAULT_MAX_SHAPES,
            max_sample_length: DEFAULT_MAX_SAMPLE_LENGTH,
            length_alternation_limit: DEFAULT_LENGTH_ALTERNATION_LIMIT,
            fold_optional_suffixes: true,
        }
    }
}

impl ShapeSettings {
    /// Default settings with a specific shape cap
    pub fn with_max_shapes(max_shapes: usize) -> Self {
        Self {
            max_shapes,
            ..Self::default()
        }
    }

    /// Check that the caps are usable
    pub fn validate(&self) -> ProfileResult<()> {
        if self.max_shapes == 0 {
            return Err(ProfileError::InvalidConfig(
                "maxShapes must be greater than zero".to_string(),
            ));
        }
        if self.max_sample_length == 0 {
            return Err(ProfileError::InvalidConfig(
                "maxSampleLength must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_compatible(&self, other: &ShapeSettings) -> ProfileResult<()> {
        fn differ<T: ToString + PartialEq>(
            setting: &'static str,
            left: T,
            right: T,
        ) -> ProfileResult<()> {
            if left == right {
                Ok(())
            } else {
                Err(ProfileError::IncompatibleMerge {
                    setting,
                    left: left.to_string(),
                    right: right.to_string(),
                })
            }
        }

        differ("maxShapes", self.max_shapes, other.max_shapes)?;
        differ(
            "maxSampleLength",
            self.max_sample_length,
            other.max_sample_length,
        )?;
        differ(
            "lengthAlternationLimit",
            self.length_alternation_limit,
            other.length_alternation_limit,
        )?;
        differ(
            "foldOptionalSuffixes",
            self.fold_optional_suffixes,
            other.fold_optional_suffixes,
        )
    }
}

/// Everything known about the samples sharing one compressed key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeCluster {
    key: CompressedKey,
    occurrences: u64,
    /// Exact run-length signatures and their weighted counts
    #[serde(with = "crate::serde_pairs")]
    shapes: BTreeMap<Vec<usize>, u64>,
    runs: Vec<RunProfile>,
}

impl ShapeCluster {
    fn from_model(key: CompressedKey, model: &ShapeModel, lengths: Vec<usize>, weight: u64) -> Self {
        Self {
            key,
            occurrences: weight,
            shapes: BTreeMap::from([(lengths, weight)]),
            runs: model.runs().to_vec(),
        }
    }

    fn absorb(&mut self, model: &ShapeModel, lengths: Vec<usize>, weight: u64) {
        self.occurrences = self.occurrences.saturating_add(weight);
        let count = self.shapes.entry(lengths).or_insert(0);
        *count = count.saturating_add(weight);
        for (mine, theirs) in self.runs.iter_mut().zip(model.runs()) {
            mine.union(theirs);
        }
    }

    fn union(&mut self, other: &ShapeCluster) {
        self.occurrences = self.occurrences.saturating_add(other.occurrences);
        for (lengths, weight) in &other.shapes {
            let count = self.shapes.entry(lengths.clone()).or_insert(0);
            *count = count.saturating_add(*weight);
        }
        for (mine, theirs) in self.runs.iter_mut().zip(&other.runs) {
            mine.union(theirs);
        }
    }

    /// Compressed key shared by every member
    pub fn key(&self) -> &CompressedKey {
        &self.key
    }

    /// Weighted number of samples absorbed
    pub fn occurrences(&self) -> u64 {
        self.occurrences
    }

    /// Exact run-length signatures with their weighted counts
    pub fn shapes(&self) -> &BTreeMap<Vec<usize>, u64> {
        &self.shapes
    }

    /// Per-run profiles
    pub fn runs(&self) -> &[RunProfile] {
        &self.runs
    }
}

/// A cluster rendered alone, or a base cluster with its optional extension
enum RenderUnit<'a> {
    Single(&'a ShapeCluster),
    Folded {
        base: &'a ShapeCluster,
        extension: &'a ShapeCluster,
    },
}

impl RenderUnit<'_> {
    /// Returns (generalized, requested) renderings; the generalized form is
    /// the sort key
    fn render(&self, tightened: bool, alternation_limit: usize) -> (String, String) {
        match self {
            RenderUnit::Single(cluster) => {
                let generalized = render_runs(&cluster.runs, false, alternation_limit);
                let requested = if tightened {
                    render_runs(&cluster.runs, true, alternation_limit)
                } else {
                    generalized.clone()
                };
                (generalized, requested)
            }
            RenderUnit::Folded { base, extension } => {
                let split = base.runs.len();
                let mut prefix = base.runs.clone();
                for (mine, theirs) in prefix.iter_mut().zip(&extension.runs[..split]) {
                    mine.union(theirs);
                }
                let suffix = &extension.runs[split..];
                let render = |tight: bool| {
                    format!(
                        "{}({})?",
                        render_runs(&prefix, tight, alternation_limit),
                        render_runs(suffix, tight, alternation_limit)
                    )
                };
                let generalized = render(false);
                let requested = if tightened {
                    render(true)
                } else {
                    generalized.clone()
                };
                (generalized, requested)
            }
        }
    }
}

/// `extension` is `base` plus one trailing literal and one digit/alpha run,
/// with identical classes and length sets over the shared prefix
fn folds_into(base: &ShapeCluster, extension: &ShapeCluster) -> bool {
    let split = base.runs.len();
    if split == 0 || extension.runs.len() != split + 2 {
        return false;
    }
    if !matches!(extension.runs[split].class(), RunClass::Literal(_))
        || !extension.runs[split + 1].class().is_variable()
    {
        return false;
    }
    base.runs
        .iter()
        .zip(&extension.runs)
        .all(|(b, e)| b.class() == e.class() && b.lengths() == e.lengths())
}

/// Streaming shape aggregator with a hard cap on distinct shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeAggregator {
    settings: ShapeSettings,
    #[serde(with = "crate::serde_pairs")]
    clusters: BTreeMap<CompressedKey, ShapeCluster>,
    distinct_shapes: usize,
    total_occurrences: u64,
    overflowed: bool,
}

impl ShapeAggregator {
    /// Create an aggregator with default settings and the given shape cap
    pub fn new(max_shapes: usize) -> ProfileResult<Self> {
        Self::with_settings(ShapeSettings::with_max_shapes(max_shapes))
    }

    /// Create an aggregator with explicit settings
    pub fn with_settings(settings: ShapeSettings) -> ProfileResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            clusters: BTreeMap::new(),
            distinct_shapes: 0,
            total_occurrences: 0,
            overflowed: false,
        })
    }

    /// Classify a sample and fold it in with the given weight
    pub fn track(&mut self, sample: &str, weight: u64) {
        if weight == 0 {
            return;
        }
        if self.overflowed {
            self.total_occurrences = self.total_occurrences.saturating_add(weight);
            return;
        }
        let model = ShapeModel::with_limit(sample, self.settings.max_sample_length);
        self.track_model(&model, weight);
    }

    /// Fold an already classified sample in with the given weight
    pub fn track_model(&mut self, model: &ShapeModel, weight: u64) {
        if weight == 0 {
            return;
        }
        self.total_occurrences = self.total_occurrences.saturating_add(weight);
        if self.overflowed {
            return;
        }

        let key = model.key().compressed();
        let lengths = model.key().lengths();
        let is_new_shape = self
            .clusters
            .get(&key)
            .is_none_or(|cluster| !cluster.shapes.contains_key(&lengths));

        if is_new_shape && self.distinct_shapes >= self.settings.max_shapes {
            self.overflow();
            return;
        }

        match self.clusters.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().absorb(model, lengths, weight),
            Entry::Vacant(entry) => {
                let cluster = ShapeCluster::from_model(entry.key().clone(), model, lengths, weight);
                entry.insert(cluster);
            }
        }
        if is_new_shape {
            self.distinct_shapes += 1;
        }
    }

    fn overflow(&mut self) {
        debug!(
            max_shapes = self.settings.max_shapes,
            clusters = self.clusters.len(),
            "Shape cap exceeded, falling back to catch-all pattern"
        );
        self.clusters.clear();
        self.distinct_shapes = 0;
        self.overflowed = true;
    }

    /// Group clusters for rendering, pairing each base with at most one
    /// optional extension
    fn render_units(&self) -> Vec<RenderUnit<'_>> {
        let candidates: Vec<&ShapeCluster> = self
            .clusters
            .values()
            .filter(|c| !c.key.is_any() && !c.runs.is_empty())
            .collect();
        let mut used = vec![false; candidates.len()];
        let mut units = Vec::with_capacity(candidates.len());

        for i in 0..candidates.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let base = candidates[i];

            let extension = if self.settings.fold_optional_suffixes {
                (i + 1..candidates.len()).find(|&j| !used[j] && folds_into(base, candidates[j]))
            } else {
                None
            };

            match extension {
                Some(j) => {
                    used[j] = true;
                    units.push(RenderUnit::Folded {
                        base,
                        extension: candidates[j],
                    });
                }
                None => units.push(RenderUnit::Single(base)),
            }
        }
        units
    }

    /// Regex describing every retained shape
    ///
    /// Returns `.+` once overflowed and `.*` before anything is tracked.
    /// Multiple clusters are joined as `(a|b|...)`, ordered by their
    /// generalized rendering so the output is stable.
    pub fn regexp(&self, tightened: bool) -> String {
        if self.overflowed {
            return CATCH_ALL.to_string();
        }
        if self.clusters.is_empty() {
            return MATCH_EVERYTHING.to_string();
        }

        let has_empty = self
            .clusters
            .contains_key(&CompressedKey::Runs(String::new()));
        if self.clusters.contains_key(&CompressedKey::Any) {
            let pattern = if has_empty { MATCH_EVERYTHING } else { CATCH_ALL };
            return pattern.to_string();
        }

        let limit = self.settings.length_alternation_limit;
        let mut rendered: Vec<(String, String)> = self
            .render_units()
            .iter()
            .map(|unit| unit.render(tightened, limit))
            .collect();
        rendered.sort();
        let alternatives: Vec<String> = rendered.into_iter().map(|(_, r)| r).collect();

        match (alternatives.len(), has_empty) {
            (0, _) => String::new(),
            (1, false) => alternatives[0].clone(),
            (1, true) => format!("({})?", alternatives[0]),
            (_, false) => format!("({})", alternatives.join("|")),
            (_, true) => format!("({})?", alternatives.join("|")),
        }
    }

    /// Check whether a sample conforms to the tightened pattern
    pub fn matches(&self, sample: &str) -> ProfileResult<bool> {
        let pattern = self.regexp(true);
        if pattern == CATCH_ALL {
            return Ok(CATCH_ALL_REGEX.is_match(sample));
        }
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .dot_matches_new_line(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()?;
        Ok(regex.is_match(sample))
    }

    /// Combine two aggregators into a new one without touching either input
    ///
    /// Clusters with the same key are unioned. If the combined number of
    /// distinct shapes exceeds the cap, or either side had overflowed, the
    /// result is overflowed.
    pub fn merge(&self, other: &ShapeAggregator) -> ProfileResult<ShapeAggregator> {
        self.settings.check_compatible(&other.settings)?;

        let mut merged = ShapeAggregator {
            settings: self.settings,
            clusters: BTreeMap::new(),
            distinct_shapes: 0,
            total_occurrences: self.total_occurrences.saturating_add(other.total_occurrences),
            overflowed: self.overflowed || other.overflowed,
        };
        if merged.overflowed {
            return Ok(merged);
        }

        merged.clusters = self.clusters.clone();
        for (key, cluster) in &other.clusters {
            match merged.clusters.get_mut(key) {
                Some(existing) => existing.union(cluster),
                None => {
                    merged.clusters.insert(key.clone(), cluster.clone());
                }
            }
        }
        merged.distinct_shapes = merged.clusters.values().map(|c| c.shapes.len()).sum();
        if merged.distinct_shapes > merged.settings.max_shapes {
            merged.overflow();
        }
        Ok(merged)
    }

    /// Settings this aggregator was built with
    pub fn settings(&self) -> &ShapeSettings {
        &self.settings
    }

    /// Retained clusters in key order
    pub fn clusters(&self) -> impl Iterator<Item = &ShapeCluster> {
        self.clusters.values()
    }

    /// Look up the cluster for a compressed key
    pub fn cluster(&self, key: &CompressedKey) -> Option<&ShapeCluster> {
        self.clusters.get(key)
    }

    /// Number of retained clusters
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Number of distinct exact shapes retained
    pub fn distinct_shapes(&self) -> usize {
        self.distinct_shapes
    }

    /// Weighted number of samples tracked, including those seen after overflow
    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences
    }

    /// Returns true once the shape cap has been exceeded
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Returns true while every tracked shape is still retained
    pub fn is_exact(&self) -> bool {
        !self.overflowed
    }
}
