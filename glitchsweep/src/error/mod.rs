// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Error types that can be returned by the sweep engine
//!
//! Only configuration problems abort a sweep, and only before the first
//! trial runs. Conditions that occur during a trial (device timeouts,
//! garbled responses) are represented by [`TrialError`] and are always
//! converted into a [`TrialOutcome`](crate::outcomes::TrialOutcome) label by
//! the harness, never propagated.

use crate::range::ParameterRange;

/// Result type for fallible sweep-engine functions
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors that fail a sweep fast, before any trial executes
pub enum Error {
    #[error("Axis {axis} reaches {value}, outside the supported domain [{min}, {max}]")]
    /// An axis produces a value outside the instrument's supported domain
    ConfigurationOutOfRange {
        /// Name of the offending axis
        axis: String,
        /// The out-of-domain value the axis would apply to the instrument
        value: i64,
        /// Lower bound of the supported domain
        min: i64,
        /// Upper bound of the supported domain
        max: i64,
    },
    #[error("A sweep requires at least one axis")]
    /// No axes were configured
    EmptyAxes,
    #[error("Axis {axis} range {range:?} is invalid: {reason}")]
    /// An axis range cannot enumerate any points
    InvalidRange {
        /// Name of the offending axis
        axis: String,
        /// The invalid range
        range: ParameterRange,
        /// Why the range is invalid
        reason: String,
    },
    #[error("repeats_per_point must be at least 1")]
    /// The per-point repeat count was zero
    InvalidRepeats,
    #[error("Required field {0} was not set")]
    /// A builder was finalized without a required field
    MissingField(String),
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(value: derive_builder::UninitializedFieldError) -> Self {
        Self::MissingField(value.field_name().to_string())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Conditions a single trial can end in at the transport level. These are
/// recovered per-trial by the harness and surface only as outcome labels.
pub enum TrialError {
    #[error("Timed out waiting for a response from the device")]
    /// The device produced no response within the read timeout
    DeviceTimeout,
    #[error("Unexpected response from the device: {0:?}")]
    /// The device produced output that does not follow its protocol
    UnexpectedResponse(String),
}
