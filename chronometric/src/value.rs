//! Scalar metric kinds
//!
//! Each kind stores only what `combine` needs to stay associative and commutative. Ratios
//! and rates keep their numerator and denominator separately and derive the readable value in
//! [`Metric::calculate`].

use chronometric_core::{MetricMeta, TimeBucket};

use crate::traits::Metric;

macro_rules! single_value_metric {
    (
        $(#[$attr:meta])*
        $name:ident {
            value: $ty:ty = $init:expr,
            merge: |$accum:ident, $input:ident| $merge:expr $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        pub struct $name {
            meta: MetricMeta,
            value: $ty,
        }

        impl $name {
            /// Create an empty metric for `entity_id` in `time_bucket`.
            pub fn new(entity_id: impl Into<String>, time_bucket: impl Into<TimeBucket>) -> Self {
                Self {
                    meta: MetricMeta::new(entity_id, time_bucket),
                    value: $init,
                }
            }

            /// Fold one observation into this metric.
            pub fn accept(&mut self, value: $ty) {
                let $accum = &mut self.value;
                let $input = value;
                $merge
            }

            /// The accumulated value.
            pub fn value(&self) -> $ty {
                self.value
            }
        }

        impl Metric for $name {
            fn meta(&self) -> &MetricMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut MetricMeta {
                &mut self.meta
            }

            fn combine(&mut self, other: &Self) {
                self.accept(other.value);
            }

            fn calculate(&mut self) {}
        }
    };
}

single_value_metric! {
    /// Counts occurrences, e.g. calls to an endpoint.
    CountMetric {
        value: u64 = 0,
        merge: |accum, input| *accum += input,
    }
}

impl CountMetric {
    /// Count a single occurrence.
    pub fn increment(&mut self) {
        self.accept(1);
    }
}

single_value_metric! {
    /// Sums observed values.
    SumMetric {
        value: i64 = 0,
        merge: |accum, input| *accum += input,
    }
}

single_value_metric! {
    /// Keeps the largest observed value.
    ///
    /// An empty metric reports `i64::MIN`, which is the identity for `max`.
    MaxMetric {
        value: i64 = i64::MIN,
        merge: |accum, input| *accum = (*accum).max(input),
    }
}

single_value_metric! {
    /// Keeps the smallest observed value.
    ///
    /// An empty metric reports `i64::MAX`, which is the identity for `min`.
    MinMetric {
        value: i64 = i64::MAX,
        merge: |accum, input| *accum = (*accum).min(input),
    }
}

/// Integer average of observed values, e.g. mean response time in milliseconds.
#[derive(Debug, Clone)]
pub struct LongAvgMetric {
    meta: MetricMeta,
    summation: i64,
    count: u64,
    value: i64,
}

impl LongAvgMetric {
    /// Create an empty metric for `entity_id` in `time_bucket`.
    pub fn new(entity_id: impl Into<String>, time_bucket: impl Into<TimeBucket>) -> Self {
        Self {
            meta: MetricMeta::new(entity_id, time_bucket),
            summation: 0,
            count: 0,
            value: 0,
        }
    }

    /// Record one observation.
    pub fn accept(&mut self, value: i64) {
        self.summation += value;
        self.count += 1;
    }

    /// Sum of every observation.
    pub fn summation(&self) -> i64 {
        self.summation
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The average as of the last [`Metric::calculate`], truncated towards zero.
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl Metric for LongAvgMetric {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut MetricMeta {
        &mut self.meta
    }

    fn combine(&mut self, other: &Self) {
        self.summation += other.summation;
        self.count += other.count;
    }

    fn calculate(&mut self) {
        self.value = match i64::try_from(self.count) {
            Ok(0) | Err(_) => 0,
            Ok(count) => self.summation / count,
        };
    }
}

/// Share of matching observations, e.g. the success rate of an endpoint.
///
/// The percentage is reported in basis points: `10000` means every observation matched.
#[derive(Debug, Clone)]
pub struct PercentMetric {
    meta: MetricMeta,
    total: u64,
    matched: u64,
    percentage: u64,
}

impl PercentMetric {
    /// Create an empty metric for `entity_id` in `time_bucket`.
    pub fn new(entity_id: impl Into<String>, time_bucket: impl Into<TimeBucket>) -> Self {
        Self {
            meta: MetricMeta::new(entity_id, time_bucket),
            total: 0,
            matched: 0,
            percentage: 0,
        }
    }

    /// Record one observation.
    pub fn accept(&mut self, matched: bool) {
        self.total += 1;
        if matched {
            self.matched += 1;
        }
    }

    /// Number of observations.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of matching observations.
    pub fn matched(&self) -> u64 {
        self.matched
    }

    /// Basis points as of the last [`Metric::calculate`].
    pub fn percentage(&self) -> u64 {
        self.percentage
    }
}

impl Metric for PercentMetric {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut MetricMeta {
        &mut self.meta
    }

    fn combine(&mut self, other: &Self) {
        self.total += other.total;
        self.matched += other.matched;
    }

    fn calculate(&mut self) {
        if self.total > 0 {
            let basis_points = u128::from(self.matched) * 10_000 / u128::from(self.total);
            self.percentage = basis_points as u64;
        }
    }
}

/// Calls per minute.
///
/// Only the call total is merged. The rate divides it by the width of the current time bucket,
/// so a downsampled copy reports a per-minute rate averaged over the hour, day or month.
#[derive(Debug, Clone)]
pub struct CpmMetric {
    meta: MetricMeta,
    total: u64,
    value: u64,
}

impl CpmMetric {
    /// Create an empty metric for `entity_id` in `time_bucket`.
    pub fn new(entity_id: impl Into<String>, time_bucket: impl Into<TimeBucket>) -> Self {
        Self {
            meta: MetricMeta::new(entity_id, time_bucket),
            total: 0,
            value: 0,
        }
    }

    /// Record `calls` calls.
    pub fn accept(&mut self, calls: u64) {
        self.total += calls;
    }

    /// Calls in this bucket.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Calls per minute as of the last [`Metric::calculate`].
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl Metric for CpmMetric {
    fn meta(&self) -> &MetricMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut MetricMeta {
        &mut self.meta
    }

    fn combine(&mut self, other: &Self) {
        self.total += other.total;
    }

    fn calculate(&mut self) {
        match self.time_bucket().duration_in_minutes() {
            Ok(minutes) => self.value = self.total / minutes,
            Err(err) => {
                tracing::warn!(
                    ?err,
                    id = %self.id(),
                    "unable to resolve bucket duration, keeping previous rate"
                );
            }
        }
    }
}
