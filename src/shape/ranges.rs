//! Observed character ranges
//!
//! A set of characters stored as sorted, disjoint, non-adjacent closed
//! intervals over code points. Union is set addition followed by coalescing.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::pattern::escape_literal;

/// Set of characters kept as coalesced closed intervals
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharRanges {
    ranges: Vec<(char, char)>,
}

impl CharRanges {
    /// Create an empty range set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a range set from arbitrary characters
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let mut ranges = Self::new();
        for c in chars {
            ranges.insert(c);
        }
        ranges
    }

    /// Add a single character, extending or joining neighbouring intervals
    pub fn insert(&mut self, c: char) {
        let cp = c as u32;
        let idx = self
            .ranges
            .partition_point(|&(_, hi)| (hi as u32) + 1 < cp);

        if let Some(&(lo, hi)) = self.ranges.get(idx) {
            if lo as u32 <= cp && cp <= hi as u32 {
                return;
            }
            if hi as u32 + 1 == cp {
                self.ranges[idx].1 = c;
                if let Some(&(next_lo, next_hi)) = self.ranges.get(idx + 1) {
                    if next_lo as u32 == cp + 1 {
                        self.ranges[idx].1 = next_hi;
                        self.ranges.remove(idx + 1);
                    }
                }
                return;
            }
            if cp + 1 == lo as u32 {
                self.ranges[idx].0 = c;
                return;
            }
        }

        self.ranges.insert(idx, (c, c));
    }

    /// Add every character of `other` to this set
    pub fn union(&mut self, other: &CharRanges) {
        if other.ranges.is_empty() {
            return;
        }
        let mut all: Vec<(char, char)> = self
            .ranges
            .iter()
            .chain(other.ranges.iter())
            .copied()
            .collect();
        all.sort_unstable();

        let mut coalesced: Vec<(char, char)> = Vec::with_capacity(all.len());
        for (lo, hi) in all {
            match coalesced.last_mut() {
                Some(last) if lo as u32 <= last.1 as u32 + 1 => {
                    if hi > last.1 {
                        last.1 = hi;
                    }
                }
                _ => coalesced.push((lo, hi)),
            }
        }
        self.ranges = coalesced;
    }

    /// Check whether a character is in the set
    pub fn contains(&self, c: char) -> bool {
        let idx = self.ranges.partition_point(|&(_, hi)| hi < c);
        self.ranges.get(idx).is_some_and(|&(lo, _)| lo <= c)
    }

    /// Number of distinct characters in the set
    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .map(|&(lo, hi)| (hi as u32 - lo as u32) as usize + 1)
            .sum()
    }

    /// Returns true if no character has been observed
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The closed intervals, ascending by code point
    pub fn intervals(&self) -> &[(char, char)] {
        &self.ranges
    }

    /// Render as a regex atom
    ///
    /// A single character renders as itself (escaped); anything wider renders
    /// as a bracketed class with `lo-hi` spans. Members are only ever digits or
    /// letters, so nothing inside the brackets needs escaping.
    pub fn to_pattern(&self) -> String {
        let mut out = String::new();
        match self.ranges.as_slice() {
            [] => {}
            [(lo, hi)] if lo == hi => escape_literal(*lo, &mut out),
            ranges => {
                out.push('[');
                for &(lo, hi) in ranges {
                    out.push(lo);
                    if lo != hi {
                        out.push('-');
                        out.push(hi);
                    }
                }
                out.push(']');
            }
        }
        out
    }
}

impl fmt::Display for CharRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pattern())
    }
}
