// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::error::InvalidPrecisionState;
use crate::time_bucket::{Precision, TimeBucket};

/// The identity of a metric: which analyzed entity it describes, and when.
///
/// Metrics are grouped, merged and deduplicated by this value. The [`Display`](fmt::Display)
/// form, `{time_bucket}_{entity_id}`, is the row id used by storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    time_bucket: TimeBucket,
    entity_id: String,
}

impl MetricId {
    /// Create an id from its parts.
    pub fn new(entity_id: impl Into<String>, time_bucket: impl Into<TimeBucket>) -> Self {
        Self {
            time_bucket: time_bucket.into(),
            entity_id: entity_id.into(),
        }
    }

    /// The analyzed entity.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The time bucket.
    pub fn time_bucket(&self) -> TimeBucket {
        self.time_bucket
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.time_bucket, self.entity_id)
    }
}

/// State shared by every metric kind: identity plus the survival counter maintained by the
/// caching layer.
///
/// The entity id never changes after construction. The time bucket only differs on the copy
/// returned by [`MetricMeta::downsample`], and only ever towards a coarser precision.
#[derive(Debug, Clone)]
pub struct MetricMeta {
    entity_id: String,
    time_bucket: TimeBucket,
    survival_time: u64,
}

impl MetricMeta {
    /// Create metadata with a survival time of 0.
    pub fn new(entity_id: impl Into<String>, time_bucket: impl Into<TimeBucket>) -> Self {
        Self {
            entity_id: entity_id.into(),
            time_bucket: time_bucket.into(),
            survival_time: 0,
        }
    }

    /// The analyzed entity.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The time bucket.
    pub fn time_bucket(&self) -> TimeBucket {
        self.time_bucket
    }

    /// How long this instance has been held by the cache, in whatever unit the cache uses.
    pub fn survival_time(&self) -> u64 {
        self.survival_time
    }

    /// Add `delta` to the survival time, saturating at `u64::MAX`.
    pub fn extend_survival_time(&mut self, delta: u64) {
        self.survival_time = self.survival_time.saturating_add(delta);
    }

    /// The identity of this metric.
    pub fn id(&self) -> MetricId {
        MetricId::new(self.entity_id.clone(), self.time_bucket)
    }

    /// Whether `other` has the same entity id and time bucket.
    pub fn same_identity(&self, other: &MetricMeta) -> bool {
        self.time_bucket == other.time_bucket && self.entity_id == other.entity_id
    }

    /// A copy for the same entity in the coarser bucket at `target`, with the survival time
    /// reset.
    ///
    /// Fails like [`TimeBucket::convert`] when `target` is not coarser than the current bucket.
    pub fn downsample(&self, target: Precision) -> Result<Self, InvalidPrecisionState> {
        Ok(Self::new(self.entity_id.clone(), self.time_bucket.convert(target)?))
    }
}
