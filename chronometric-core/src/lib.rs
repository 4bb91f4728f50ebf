// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! This crate contains the time bucket arithmetic and identity types for the
//! `chronometric` set of libraries. Generally, you should not depend on this crate
//! directly. Instead, use `chronometric`

mod error;
mod meta;
mod time_bucket;

pub use error::InvalidPrecisionState;
pub use meta::{MetricId, MetricMeta};
pub use time_bucket::{Precision, TimeBucket};
