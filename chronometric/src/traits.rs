//! The metric entity contract
//!
//! Every metric kind carries a [`MetricMeta`] (entity id, time bucket, survival time) next to
//! its own payload, and implements [`Metric`]. The trait has four required methods:
//!
//! - [`Metric::meta`] and [`Metric::meta_mut`] expose the shared state
//! - [`Metric::combine`] folds another partial state for the same identity into `self`
//! - [`Metric::calculate`] turns the accumulated raw state into the value that gets read
//!
//! Downsampling ([`Metric::to_hour`], [`Metric::to_day`], [`Metric::to_month`]) is provided on
//! top of `Clone`: the payload is copied as-is and only the metadata changes. Kinds whose payload
//! depends on the bucket width re-derive it in `calculate`, see [`crate::value::CpmMetric`].
//!
//! ## Ordering
//!
//! `combine` must be associative and commutative. A caller that groups partial states by
//! [`Metric::id`] and merges them in any order, with any grouping, and then calls `calculate`
//! always reads the same value. This is what lets the aggregation worker accept at-least-once,
//! out-of-order delivery.
//!
//! ## Example
//!
//! ```rust
//! use chronometric::value::LongAvgMetric;
//! use chronometric::{Metric, TimeBucket};
//!
//! let mut first = LongAvgMetric::new("service-a", 201809120511);
//! first.accept(100);
//! let mut second = LongAvgMetric::new("service-a", 201809120511);
//! second.accept(300);
//!
//! first.combine(&second);
//! first.calculate();
//! assert_eq!(first.value(), 200);
//!
//! let hour = first.to_hour().unwrap();
//! assert_eq!(hour.time_bucket(), TimeBucket::new(2018091205));
//! assert_eq!(first.time_bucket(), TimeBucket::new(201809120511));
//! ```

use std::fmt;

use chronometric_core::{InvalidPrecisionState, MetricId, MetricMeta, Precision, TimeBucket};

/// A statistical measurement for one entity in one time bucket.
///
/// See the [module docs](self) for the contract.
pub trait Metric: Clone {
    /// Identity and survival bookkeeping.
    fn meta(&self) -> &MetricMeta;

    /// Mutable access to identity and survival bookkeeping.
    fn meta_mut(&mut self) -> &mut MetricMeta;

    /// Merge the accumulated state of `other` into `self`.
    ///
    /// `other` must have the same entity id and time bucket. This is not checked; grouping is
    /// the caller's job. Use [`Metric::try_combine`] when the inputs are not already grouped.
    fn combine(&mut self, other: &Self);

    /// Finalize every value derived from the accumulated state.
    ///
    /// Calling this again without an intervening [`Metric::combine`] yields the same state.
    fn calculate(&mut self);

    /// The analyzed entity.
    fn entity_id(&self) -> &str {
        self.meta().entity_id()
    }

    /// The time bucket this metric is aggregated in.
    fn time_bucket(&self) -> TimeBucket {
        self.meta().time_bucket()
    }

    /// The precision implied by [`Metric::time_bucket`].
    fn precision(&self) -> Precision {
        self.time_bucket().precision()
    }

    /// The identity metrics are grouped by.
    fn id(&self) -> MetricId {
        self.meta().id()
    }

    /// The caching layer's residency counter.
    fn survival_time(&self) -> u64 {
        self.meta().survival_time()
    }

    /// Add `delta` to the caching layer's residency counter.
    fn extend_survival_time(&mut self, delta: u64) {
        self.meta_mut().extend_survival_time(delta);
    }

    /// [`Metric::combine`], after checking that `other` has the same identity.
    fn try_combine(&mut self, other: &Self) -> Result<(), IdentityMismatch> {
        if !self.meta().same_identity(other.meta()) {
            return Err(IdentityMismatch {
                expected: self.id(),
                actual: other.id(),
            });
        }
        self.combine(other);
        Ok(())
    }

    /// A copy of this metric at hour precision. Only minute buckets can be converted.
    fn to_hour(&self) -> Result<Self, InvalidPrecisionState> {
        downsampled(self, Precision::Hour)
    }

    /// A copy of this metric at day precision, from a minute or hour bucket.
    fn to_day(&self) -> Result<Self, InvalidPrecisionState> {
        downsampled(self, Precision::Day)
    }

    /// A copy of this metric at month precision, from a minute, hour or day bucket.
    fn to_month(&self) -> Result<Self, InvalidPrecisionState> {
        downsampled(self, Precision::Month)
    }

    /// Dispatch to [`Metric::to_hour`], [`Metric::to_day`] or [`Metric::to_month`].
    ///
    /// A [`Precision::Minute`] target always fails, there is nothing finer to convert from.
    fn downsample(&self, target: Precision) -> Result<Self, InvalidPrecisionState> {
        downsampled(self, target)
    }
}

// payload is copied as-is; the bucket only ever moves to a coarser precision
fn downsampled<M: Metric>(metric: &M, target: Precision) -> Result<M, InvalidPrecisionState> {
    let meta = metric.meta().downsample(target)?;
    let mut copy = metric.clone();
    *copy.meta_mut() = meta;
    Ok(copy)
}

/// Returned by [`Metric::try_combine`] when the two metrics do not share an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMismatch {
    expected: MetricId,
    actual: MetricId,
}

impl IdentityMismatch {
    /// The identity of the metric being merged into.
    pub fn expected(&self) -> &MetricId {
        &self.expected
    }

    /// The identity of the rejected metric.
    pub fn actual(&self) -> &MetricId {
        &self.actual
    }
}

impl fmt::Display for IdentityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot combine metric `{}` into metric `{}`",
            self.actual, self.expected
        )
    }
}

impl std::error::Error for IdentityMismatch {}
