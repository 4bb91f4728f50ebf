//! Keyed aggregation of metric entities
//!
//! [`MetricsAggregator`] is the single owner of one batch of partial states. It groups them by
//! [`MetricId`], combines each group in arrival order and finalizes on [`MetricsAggregator::drain`].
//! Because `combine` is associative and commutative, the drained values do not depend on that
//! order.
//!
//! Rolling up is a second aggregation pass: [`MetricsAggregator::downsample`] converts every
//! entry to the coarser bucket and aggregates the copies again, so sixty minute entries for the
//! same entity collapse into one hour entry.

use chronometric_core::{InvalidPrecisionState, MetricId, Precision};
use hashbrown::hash_map::Entry;

use crate::traits::Metric;

/// Groups metrics by identity and combines each group.
///
/// This type performs no locking. Callers sharing it between threads wrap it in a lock or give
/// each worker its own aggregator.
pub struct MetricsAggregator<M> {
    storage: hashbrown::HashMap<MetricId, M>,
}

impl<M: Metric> MetricsAggregator<M> {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self {
            storage: hashbrown::HashMap::new(),
        }
    }

    /// Combine `metric` into the entry with the same identity, or start a new entry.
    pub fn add(&mut self, metric: M) {
        match self.storage.entry(metric.id()) {
            Entry::Occupied(mut slot) => {
                tracing::trace!(id = %slot.key(), "combining metric");
                slot.get_mut().combine(&metric);
            }
            Entry::Vacant(slot) => {
                tracing::trace!(id = %slot.key(), "new metric");
                slot.insert(metric);
            }
        }
    }

    /// The combined, not yet calculated, entry for `id`.
    pub fn get(&self, id: &MetricId) -> Option<&M> {
        self.storage.get(id)
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether nothing has been added since the last drain.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &M> {
        self.storage.values()
    }

    /// Calculate and remove every entry, ordered by identity.
    pub fn drain(&mut self) -> Vec<M> {
        let mut drained: Vec<(MetricId, M)> = self
            .storage
            .drain()
            .map(|(id, mut metric)| {
                metric.calculate();
                (id, metric)
            })
            .collect();
        drained.sort_by(|(a, _), (b, _)| a.cmp(b));
        tracing::debug!(count = drained.len(), "drained metrics");
        drained.into_iter().map(|(_, metric)| metric).collect()
    }

    /// Aggregate a copy of every entry at the `target` precision.
    ///
    /// `self` is left untouched, survival times on the copies start at 0. Fails on the first
    /// entry whose bucket cannot be converted to `target`.
    pub fn downsample(&self, target: Precision) -> Result<Self, InvalidPrecisionState> {
        let mut rolled_up = Self::new();
        for metric in self.storage.values() {
            rolled_up.add(metric.downsample(target)?);
        }
        tracing::debug!(
            %target,
            from = self.len(),
            to = rolled_up.len(),
            "downsampled metrics"
        );
        Ok(rolled_up)
    }
}

impl<M: Metric> Default for MetricsAggregator<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> Extend<M> for MetricsAggregator<M> {
    fn extend<I: IntoIterator<Item = M>>(&mut self, iter: I) {
        for metric in iter {
            self.add(metric);
        }
    }
}

impl<M: Metric> FromIterator<M> for MetricsAggregator<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(iter);
        aggregator
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use chronometric_core::{MetricId, Precision, TimeBucket};

    use super::MetricsAggregator;
    use crate::traits::Metric;
    use crate::value::CountMetric;

    fn count(entity: &str, bucket: u64, value: u64) -> CountMetric {
        let mut metric = CountMetric::new(entity, bucket);
        metric.accept(value);
        metric
    }

    #[test]
    fn groups_by_identity() {
        let mut aggregator = MetricsAggregator::new();
        aggregator.add(count("a", 201809120511, 1));
        aggregator.add(count("a", 201809120511, 2));
        aggregator.add(count("b", 201809120511, 4));
        aggregator.add(count("a", 201809120512, 8));

        check!(aggregator.len() == 3);
        let_assert!(Some(a) = aggregator.get(&MetricId::new("a", 201809120511)));
        check!(a.value() == 3);
    }

    #[test]
    fn drain_orders_by_identity_and_empties() {
        let mut aggregator: MetricsAggregator<_> = [
            count("b", 201809120512, 1),
            count("a", 201809120512, 1),
            count("b", 201809120511, 1),
        ]
        .into_iter()
        .collect();

        let ids: Vec<_> = aggregator.drain().iter().map(|m| m.id().to_string()).collect();
        check!(ids == ["201809120511_b", "201809120512_a", "201809120512_b"]);
        check!(aggregator.is_empty());
    }

    #[test]
    fn downsample_leaves_source_untouched() {
        let mut source = MetricsAggregator::new();
        let mut minute = count("a", 201809120511, 5);
        minute.extend_survival_time(9);
        source.add(minute);
        source.add(count("a", 201809120559, 7));

        let hour = source.downsample(Precision::Hour).unwrap();
        check!(hour.len() == 1);
        let_assert!(Some(a) = hour.get(&MetricId::new("a", 2018091205)));
        check!(a.value() == 12);
        check!(a.survival_time() == 0);

        check!(source.len() == 2);
        let_assert!(Some(original) = source.get(&MetricId::new("a", 201809120511)));
        check!(original.survival_time() == 9);
        check!(original.time_bucket() == TimeBucket::new(201809120511));
    }

    #[test]
    fn downsample_surfaces_invalid_precision() {
        let source: MetricsAggregator<_> = [count("a", 201809, 1)].into_iter().collect();
        let_assert!(Err(err) = source.downsample(Precision::Day));
        check!(err.bucket() == TimeBucket::new(201809));
        check!(err.operation() == "to_day");
    }
}
