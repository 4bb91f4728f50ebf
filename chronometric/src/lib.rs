#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Metric entities that merge out of order and roll up from minutes to months.

pub mod aggregator;
pub mod histogram;
pub mod traits;
pub mod value;

pub use aggregator::MetricsAggregator;
pub use chronometric_core::{InvalidPrecisionState, MetricId, MetricMeta, Precision, TimeBucket};
pub use traits::{IdentityMismatch, Metric};
