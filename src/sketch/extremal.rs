//! Exact top/bottom-K tracking over any ordered key

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};

/// Default number of extremes tracked on each side
pub const DEFAULT_TOP_BOTTOM_K: usize = 10;

/// Keeps the K smallest and K largest distinct keys seen
///
/// Each retained key carries its provenance, the text it was parsed from.
/// When several texts map to the same key the lexically smallest one is kept,
/// so the result does not depend on observation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(
        serialize = "K: Serialize",
        deserialize = "K: Deserialize<'de> + Ord"
    )
)]
pub struct TopBottomK<K> {
    capacity: usize,
    #[serde(with = "crate::serde_pairs")]
    bottom: BTreeMap<K, String>,
    #[serde(with = "crate::serde_pairs")]
    top: BTreeMap<K, String>,
}

#[derive(Clone, Copy)]
enum Side {
    Bottom,
    Top,
}

impl<K: Ord + Clone> TopBottomK<K> {
    /// Create a sketch holding up to `capacity` keys per side
    pub fn new(capacity: usize) -> ProfileResult<Self> {
        if capacity == 0 {
            return Err(ProfileError::InvalidConfig(
                "topBottomK must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            bottom: BTreeMap::new(),
            top: BTreeMap::new(),
        })
    }

    /// Observe a key using its own rendering as provenance
    pub fn observe(&mut self, key: K)
    where
        K: Display,
    {
        let text = key.to_string();
        self.observe_with_text(key, &text);
    }

    /// Observe a key parsed from `text`
    pub fn observe_with_text(&mut self, key: K, text: &str) {
        let capacity = self.capacity;
        offer(&mut self.bottom, Side::Bottom, capacity, key.clone(), text);
        offer(&mut self.top, Side::Top, capacity, key, text);
    }

    /// Smallest keys, ascending
    pub fn bottom_k(&self) -> Vec<K> {
        self.bottom.keys().cloned().collect()
    }

    /// Largest keys, descending
    pub fn top_k(&self) -> Vec<K> {
        self.top.keys().rev().cloned().collect()
    }

    /// Provenance of the smallest keys, ascending by key
    pub fn bottom_k_strings(&self) -> Vec<&str> {
        self.bottom.values().map(String::as_str).collect()
    }

    /// Provenance of the largest keys, descending by key
    pub fn top_k_strings(&self) -> Vec<&str> {
        self.top.values().rev().map(String::as_str).collect()
    }

    /// Smallest key seen
    pub fn min(&self) -> Option<&K> {
        self.bottom.keys().next()
    }

    /// Largest key seen
    pub fn max(&self) -> Option<&K> {
        self.top.keys().next_back()
    }

    /// Provenance of the smallest key
    pub fn min_text(&self) -> Option<&str> {
        self.bottom.values().next().map(String::as_str)
    }

    /// Provenance of the largest key
    pub fn max_text(&self) -> Option<&str> {
        self.top.values().next_back().map(String::as_str)
    }

    /// Maximum keys held per side
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if nothing has been observed
    pub fn is_empty(&self) -> bool {
        self.bottom.is_empty()
    }

    /// Combine two sketches into a new one
    ///
    /// Each side of the result holds the K extremes of the union of both
    /// inputs, which is exact because each input is exact for its own shard.
    pub fn merge(&self, other: &TopBottomK<K>) -> ProfileResult<TopBottomK<K>> {
        if self.capacity != other.capacity {
            return Err(ProfileError::IncompatibleMerge {
                setting: "topBottomK",
                left: self.capacity.to_string(),
                right: other.capacity.to_string(),
            });
        }
        let mut merged = self.clone();
        for (key, text) in &other.bottom {
            offer(&mut merged.bottom, Side::Bottom, self.capacity, key.clone(), text);
        }
        for (key, text) in &other.top {
            offer(&mut merged.top, Side::Top, self.capacity, key.clone(), text);
        }
        Ok(merged)
    }
}

fn offer<K: Ord>(held: &mut BTreeMap<K, String>, side: Side, capacity: usize, key: K, text: &str) {
    if let Some(existing) = held.get_mut(&key) {
        if text < existing.as_str() {
            *existing = text.to_string();
        }
        return;
    }

    if held.len() < capacity {
        held.insert(key, text.to_string());
        return;
    }

    let displaces = match side {
        Side::Bottom => held.last_key_value().is_some_and(|(largest, _)| key < *largest),
        Side::Top => held.first_key_value().is_some_and(|(smallest, _)| key > *smallest),
    };
    if displaces {
        held.insert(key, text.to_string());
        match side {
            Side::Bottom => held.pop_last(),
            Side::Top => held.pop_first(),
        };
    }
}
