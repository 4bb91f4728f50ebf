//! Bucketed metric kinds: distributions and percentiles.
//!
//! Both kinds keep a sparse map from bucket to occurrence count. Merging two of them adds the
//! counts bucket by bucket, which is associative and commutative no matter how observations
//! were split between the partial states.
//!
//! # Example
//!
//! ```
//! use chronometric::histogram::{PercentileConfig, PercentileMetric};
//! use chronometric::Metric;
//!
//! let config = PercentileConfig::default();
//! let mut latency = PercentileMetric::new("endpoint-a", 201809120511, &config);
//! for millis in [12, 18, 25, 31, 250] {
//!     latency.accept(millis);
//! }
//! latency.calculate();
//! assert_eq!(latency.value(50), Some(20));
//! assert_eq!(latency.value(99), Some(250));
//! ```
//!
//! # Choosing a bucket width
//!
//! The width is fixed per metric ([`HistogramConfig::step`], [`PercentileConfig::precision`])
//! and must be the same for every partial state that gets combined. Wider buckets use less
//! memory and report values rounded down to a multiple of the width.

use std::collections::BTreeMap;

use chronometric_core::{MetricMeta, TimeBucket};
use smallvec::SmallVec;

use crate::traits::Metric;

/// Percentile ranks reported when none are configured.
pub const DEFAULT_RANKS: [u32; 5] = [50, 75, 90, 95, 99];

/// Configuration for [`HistogramMetric`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramConfig {
    /// Width of each bucket. A step of 0 is treated as 1.
    pub step: u64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { step: 1 }
    }
}

/// Configuration for [`PercentileMetric`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentileConfig {
    /// Width of each bucket. A precision of 0 is treated as 1.
    pub precision: u64,
    /// Ranks to report, each in `0..=100`. Larger ranks are clamped to 100.
    pub ranks: SmallVec<[u32; 5]>,
}

impl Default for PercentileConfig {
    fn default() -> Self {
        Self {
            precision: 10,
            ranks: SmallVec::from_buf(DEFAULT_RANKS),
        }
    }
}

fn bucket_of(value: u64, width: u64) -> u64 {
    value / width * width
}

fn merge_counts(into: &mut BTreeMap<u64, u64>, from: &BTreeMap<u64, u64>) {
    for (&bucket, &count) in from {
        *into.entry(bucket).or_default() += count;
    }
}

/// Distribution of observed values over fixed-width buckets.
///
/// Each bucket is keyed by its lower bound, so with a step of 100 the value 250 lands in
/// bucket 200.
#[derive(Debug, Clone)]
pub struct HistogramMetric {
    meta: MetricMeta,
    step: u64,
    dataset: BTreeMap<u64, u64>,
}

impl HistogramMetric {
    /// Create an empty histogram for `entity_id` in `time_bucket`.
    pub fn new(
        entity_id: impl Into<String>,
        time_bucket: impl Into<TimeBucket>,
        config: &HistogramConfig,
    ) -> Self {
        Self {
            meta: MetricMeta::new(entity_id, time_bucket),
            step: config.step.max(1),
            dataset: BTreeMap::new(),
        }
    }

    /// Record one observation.
    pub fn accept(&mut self, value: u64) {
        *self.dataset.entry(bucket_of(value, self.step)).or_default() += 1;
    }

    /// The bucket width.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Non-empty buckets as `(lower_bound, count)`, in ascending order.
    pub fn buckets(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.dataset.iter().map(|(&bucket, &count)| (bucket, count))
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.dataset.values().sum()
    }
}

impl Metric for HistogramMetric {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut MetricMeta {
        &mut self.meta
    }

    fn combine(&mut self, other: &Self) {
        debug_assert_eq!(self.step, other.step, "histograms with different steps");
        merge_counts(&mut self.dataset, &other.dataset);
    }

    fn calculate(&mut self) {}
}

/// Percentiles of observed values.
///
/// Values are bucketed by `precision`. For a rank `r`, [`Metric::calculate`] picks the smallest
/// bucket whose cumulative count reaches `round(total * r / 100)` and reports its lower bound.
#[derive(Debug, Clone)]
pub struct PercentileMetric {
    meta: MetricMeta,
    precision: u64,
    ranks: SmallVec<[u32; 5]>,
    dataset: BTreeMap<u64, u64>,
    values: SmallVec<[(u32, u64); 5]>,
}

impl PercentileMetric {
    /// Create an empty metric for `entity_id` in `time_bucket`.
    pub fn new(
        entity_id: impl Into<String>,
        time_bucket: impl Into<TimeBucket>,
        config: &PercentileConfig,
    ) -> Self {
        Self {
            meta: MetricMeta::new(entity_id, time_bucket),
            precision: config.precision.max(1),
            ranks: config.ranks.iter().map(|&rank| rank.min(100)).collect(),
            dataset: BTreeMap::new(),
            values: SmallVec::new(),
        }
    }

    /// Record one observation.
    pub fn accept(&mut self, value: u64) {
        *self.dataset.entry(value / self.precision).or_default() += 1;
    }

    /// The bucket width, [`PercentileConfig::precision`] after clamping.
    pub fn step(&self) -> u64 {
        self.precision
    }

    /// The configured ranks.
    pub fn ranks(&self) -> &[u32] {
        &self.ranks
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.dataset.values().sum()
    }

    /// `(rank, value)` pairs as of the last [`Metric::calculate`], in configured rank order.
    ///
    /// Empty when nothing had been observed.
    pub fn values(&self) -> &[(u32, u64)] {
        &self.values
    }

    /// The value at `rank` as of the last [`Metric::calculate`].
    pub fn value(&self, rank: u32) -> Option<u64> {
        self.values
            .iter()
            .find(|(r, _)| *r == rank)
            .map(|&(_, value)| value)
    }

    fn rank_value(&self, total: u64, rank: u32) -> u64 {
        // round half up
        let roof = (u128::from(total) * u128::from(rank) + 50) / 100;
        let mut seen = 0;
        let mut index = 0;
        for (&bucket, &count) in &self.dataset {
            index = bucket;
            seen += u128::from(count);
            if seen >= roof {
                break;
            }
        }
        index * self.precision
    }
}

impl Metric for PercentileMetric {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut MetricMeta {
        &mut self.meta
    }

    fn combine(&mut self, other: &Self) {
        debug_assert_eq!(
            self.precision, other.precision,
            "percentiles with different precisions"
        );
        merge_counts(&mut self.dataset, &other.dataset);
    }

    fn calculate(&mut self) {
        let total = self.count();
        let values = if total == 0 {
            SmallVec::new()
        } else {
            self.ranks
                .iter()
                .map(|&rank| (rank, self.rank_value(total, rank)))
                .collect()
        };
        self.values = values;
    }
}
