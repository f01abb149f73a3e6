//! Shape model for a single sample
//!
//! A sample is scanned left to right into maximal runs of digits and
//! alphabetic characters; every other character is a literal run of its own.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::pattern::{
    ALPHA_CLASS, CATCH_ALL, DEFAULT_LENGTH_ALTERNATION_LIMIT, DIGIT_CLASS, escape_literal, quantify,
    repeat,
};
use super::ranges::CharRanges;
use crate::error::{ProfileError, ProfileResult};

/// Longest sample (in characters) that keeps its structural shape by default
pub const DEFAULT_MAX_SAMPLE_LENGTH: usize = 128;

/// Character class of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunClass {
    /// ASCII decimal digits
    Digit,
    /// Alphabetic code points, any case
    Alpha,
    /// Any other single character, kept verbatim
    Literal(char),
}

impl RunClass {
    fn of(c: char) -> RunClass {
        if c.is_ascii_digit() {
            RunClass::Digit
        } else if c.is_alphabetic() {
            RunClass::Alpha
        } else {
            RunClass::Literal(c)
        }
    }

    /// Marker used in compressed keys; literals are never digits or letters
    /// so the markers cannot collide with them
    fn marker(&self) -> char {
        match self {
            RunClass::Digit => '9',
            RunClass::Alpha => 'X',
            RunClass::Literal(c) => *c,
        }
    }

    /// Returns true for digit and alphabetic runs
    pub fn is_variable(&self) -> bool {
        !matches!(self, RunClass::Literal(_))
    }
}

/// One run of a shape key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Run {
    pub class: RunClass,
    pub len: usize,
}

/// Exact structural signature of one sample
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKey {
    /// Ordered runs; empty for the empty string
    Runs(Vec<Run>),
    /// Catch-all for samples too long to profile structurally
    Any,
}

impl ShapeKey {
    /// Runs of this key (empty for `Any`)
    pub fn runs(&self) -> &[Run] {
        match self {
            ShapeKey::Runs(runs) => runs,
            ShapeKey::Any => &[],
        }
    }

    /// Returns true for the catch-all shape
    pub fn is_any(&self) -> bool {
        matches!(self, ShapeKey::Any)
    }

    /// Run lengths in order, the part of the key erased by compression
    pub fn lengths(&self) -> Vec<usize> {
        self.runs().iter().map(|r| r.len).collect()
    }

    /// Erase run lengths
    pub fn compressed(&self) -> CompressedKey {
        match self {
            ShapeKey::Runs(runs) => {
                CompressedKey::Runs(runs.iter().map(|r| r.class.marker()).collect())
            }
            ShapeKey::Any => CompressedKey::Any,
        }
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKey::Any => write!(f, "ANY"),
            ShapeKey::Runs(runs) => {
                for run in runs {
                    match run.class {
                        RunClass::Literal(c) => write!(f, "{c}")?,
                        class => write!(f, "{}{{{}}}", class.marker(), run.len)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Shape key with run lengths erased, the clustering key of the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompressedKey {
    /// One marker per run: `9` digits, `X` letters, literals verbatim
    Runs(String),
    Any,
}

impl CompressedKey {
    /// Returns true for the catch-all key
    pub fn is_any(&self) -> bool {
        matches!(self, CompressedKey::Any)
    }
}

impl fmt::Display for CompressedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressedKey::Runs(markers) => write!(f, "{markers}"),
            CompressedKey::Any => write!(f, "ANY"),
        }
    }
}

/// Accumulated knowledge about one run position of a shape
///
/// `positions[i]` holds every character seen at offset `i` within the run, so
/// its length is the longest run observed. Literal runs carry no positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProfile {
    class: RunClass,
    lengths: BTreeSet<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    positions: Vec<CharRanges>,
}

impl RunProfile {
    fn from_chars(class: RunClass, chars: &[char]) -> Self {
        let positions = if class.is_variable() {
            chars.iter().map(|&c| CharRanges::from_chars([c])).collect()
        } else {
            Vec::new()
        };
        Self {
            class,
            lengths: BTreeSet::from([chars.len()]),
            positions,
        }
    }

    /// Character class of this run
    pub fn class(&self) -> RunClass {
        self.class
    }

    /// Distinct lengths observed for this run
    pub fn lengths(&self) -> &BTreeSet<usize> {
        &self.lengths
    }

    /// Observed characters at each offset within the run
    pub fn positions(&self) -> &[CharRanges] {
        &self.positions
    }

    /// Union of the characters seen at any offset
    pub fn span(&self) -> CharRanges {
        let mut span = CharRanges::new();
        for position in &self.positions {
            span.union(position);
        }
        span
    }

    /// Fold another profile of the same class into this one
    pub(crate) fn union(&mut self, other: &RunProfile) {
        debug_assert_eq!(self.class, other.class);
        self.lengths.extend(other.lengths.iter().copied());
        if other.positions.len() > self.positions.len() {
            self.positions.resize(other.positions.len(), CharRanges::new());
        }
        for (mine, theirs) in self.positions.iter_mut().zip(&other.positions) {
            mine.union(theirs);
        }
    }

    /// Class and length only
    pub(crate) fn generalized(&self, alternation_limit: usize) -> String {
        match self.class {
            RunClass::Literal(c) => {
                let mut out = String::new();
                escape_literal(c, &mut out);
                out
            }
            RunClass::Digit => quantify(DIGIT_CLASS, &self.lengths, alternation_limit),
            RunClass::Alpha => quantify(ALPHA_CLASS, &self.lengths, alternation_limit),
        }
    }

    /// Observed characters per position
    ///
    /// Fixed-length runs render one atom per offset, merging consecutive
    /// identical classes into a repeat. Variable-length runs render the
    /// union of all offsets under the length policy.
    pub(crate) fn tightened(&self, alternation_limit: usize) -> String {
        if let RunClass::Literal(_) = self.class {
            return self.generalized(alternation_limit);
        }

        if self.lengths.len() > 1 {
            return quantify(&self.span().to_pattern(), &self.lengths, alternation_limit);
        }

        let mut out = String::new();
        let mut idx = 0;
        while idx < self.positions.len() {
            let current = &self.positions[idx];
            let mut count = 1;
            while idx + count < self.positions.len() && self.positions[idx + count] == *current {
                count += 1;
            }
            let atom = current.to_pattern();
            if current.len() == 1 {
                // Single characters stay spelled out so one observation reads
                // as the literal sample
                for _ in 0..count {
                    out.push_str(&atom);
                }
            } else {
                out.push_str(&repeat(&atom, count));
            }
            idx += count;
        }
        out
    }
}

/// Render a sequence of run profiles
pub(crate) fn render_runs(runs: &[RunProfile], tightened: bool, alternation_limit: usize) -> String {
    runs.iter()
        .map(|run| {
            if tightened {
                run.tightened(alternation_limit)
            } else {
                run.generalized(alternation_limit)
            }
        })
        .collect()
}

/// Split a sample into runs; `None` when it is longer than `max_len` chars
fn tokenize(sample: &str, max_len: usize) -> Option<Vec<RunProfile>> {
    let chars: Vec<char> = sample.chars().collect();
    if chars.len() > max_len {
        return None;
    }

    let mut runs = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let class = RunClass::of(chars[start]);
        let mut end = start + 1;
        if class.is_variable() {
            while end < chars.len() && RunClass::of(chars[end]) == class {
                end += 1;
            }
        }
        runs.push(RunProfile::from_chars(class, &chars[start..end]));
        start = end;
    }
    Some(runs)
}

/// Classify a sample with the default length limit
pub fn classify(sample: &str) -> ShapeKey {
    ShapeModel::new(sample).key
}

/// Shape of one sample, or of several samples sharing one exact shape key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeModel {
    key: ShapeKey,
    runs: Vec<RunProfile>,
    observations: u64,
}

impl ShapeModel {
    /// Build the model for one sample using [`DEFAULT_MAX_SAMPLE_LENGTH`]
    pub fn new(sample: &str) -> Self {
        Self::with_limit(sample, DEFAULT_MAX_SAMPLE_LENGTH)
    }

    /// Build the model for one sample; samples longer than `max_len`
    /// characters become the catch-all shape
    pub fn with_limit(sample: &str, max_len: usize) -> Self {
        let (key, runs) = match tokenize(sample, max_len) {
            Some(runs) => {
                let key = ShapeKey::Runs(
                    runs.iter()
                        .map(|r| Run {
                            class: r.class,
                            len: r.lengths.first().copied().unwrap_or(0),
                        })
                        .collect(),
                );
                (key, runs)
            }
            None => (ShapeKey::Any, Vec::new()),
        };
        Self {
            key,
            runs,
            observations: 1,
        }
    }

    /// Exact shape key
    pub fn key(&self) -> &ShapeKey {
        &self.key
    }

    /// Number of samples folded into this model
    pub fn observations(&self) -> u64 {
        self.observations
    }

    pub(crate) fn runs(&self) -> &[RunProfile] {
        &self.runs
    }

    /// Merge the observations of another sample with the identical shape key
    pub fn absorb(&mut self, other: &ShapeModel) -> ProfileResult<()> {
        if self.key != other.key {
            return Err(ProfileError::ShapeMismatch {
                left: self.key.to_string(),
                right: other.key.to_string(),
            });
        }
        for (mine, theirs) in self.runs.iter_mut().zip(&other.runs) {
            mine.union(theirs);
        }
        self.observations = self.observations.saturating_add(other.observations);
        Ok(())
    }

    /// Regex encoding class and length of each run
    pub fn generalized_regexp(&self) -> String {
        if self.key.is_any() {
            return CATCH_ALL.to_string();
        }
        render_runs(&self.runs, false, DEFAULT_LENGTH_ALTERNATION_LIMIT)
    }

    /// Regex built from the characters observed at each position
    ///
    /// For a single observation this is the escaped sample itself.
    pub fn tight_regexp(&self) -> String {
        if self.key.is_any() {
            return CATCH_ALL.to_string();
        }
        render_runs(&self.runs, true, DEFAULT_LENGTH_ALTERNATION_LIMIT)
    }
}
