// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::time_bucket::{Precision, TimeBucket};

/// An error returned when a time bucket is asked for a transformation its precision does not
/// support, e.g. converting a month bucket to hours, or resolving the calendar month of a value
/// whose digits are not a real `YYYYMM`.
///
/// This is a logic or data error, never a transient one. Retrying with the same bucket will
/// fail the same way.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InvalidPrecisionState {
    bucket: TimeBucket,
    operation: &'static str,
}

impl InvalidPrecisionState {
    /// Record that `operation` is not supported on `bucket`.
    pub fn new(bucket: TimeBucket, operation: &'static str) -> Self {
        Self { bucket, operation }
    }

    /// The bucket the operation was attempted on.
    pub fn bucket(&self) -> TimeBucket {
        self.bucket
    }

    /// The precision `bucket` was classified as.
    pub fn precision(&self) -> Precision {
        self.bucket.precision()
    }

    /// The rejected operation, e.g. `"to_hour"`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Debug for InvalidPrecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidPrecisionState")
            .field("bucket", &self.bucket.get())
            .field("precision", &self.precision())
            .field("operation", &self.operation)
            .finish()
    }
}

impl fmt::Display for InvalidPrecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time bucket {} in {} precision does not support `{}`",
            self.bucket,
            self.precision(),
            self.operation
        )
    }
}

impl std::error::Error for InvalidPrecisionState {}
