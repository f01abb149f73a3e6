//! Streaming mean and variance

use serde::{Deserialize, Serialize};

/// Count, mean and sum of squared deviations of a numeric stream
///
/// Single observations and shard merges both go through Chan's parallel
/// formula, so merged accumulators agree with direct ones up to rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation
    pub fn record(&mut self, value: f64) {
        self.record_weighted(value, 1);
    }

    /// Add `weight` observations of the same value
    pub fn record_weighted(&mut self, value: f64, weight: u64) {
        if weight == 0 {
            return;
        }
        *self = self.merge(&Moments {
            count: weight,
            mean: value,
            m2: 0.0,
        });
    }

    /// Combine two accumulators
    ///
    /// The mean is a weighted average of the two means, kept between them, so
    /// it stays finite for finite inputs. The squared-deviation sum saturates
    /// at `f64::MAX` when the true value is not representable.
    pub fn merge(&self, other: &Moments) -> Moments {
        if other.count == 0 {
            return *self;
        }
        if self.count == 0 {
            return *other;
        }

        let count = self.count.saturating_add(other.count);
        let n = count as f64;
        let (wa, wb) = (self.count as f64 / n, other.count as f64 / n);
        let half_delta = other.mean / 2.0 - self.mean / 2.0;
        let cross = 4.0 * (half_delta * wa) * (half_delta * other.count as f64);

        let (low, high) = (self.mean.min(other.mean), self.mean.max(other.mean));
        Moments {
            count,
            mean: (self.mean * wa + other.mean * wb).clamp(low, high),
            m2: saturate(self.m2 + other.m2 + cross),
        }
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn sum(&self) -> Option<f64> {
        (self.count > 0).then(|| self.mean * self.count as f64)
    }

    /// Sample variance (n - 1 denominator)
    pub fn variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    /// Population variance (n denominator)
    pub fn population_variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

fn saturate(value: f64) -> f64 {
    if value.is_finite() { value } else { f64::MAX }
}
