// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Exhaustive grid sweep engine and trial harness for clock-glitch fault
//! injection campaigns.
//!
//! Glitch parameters (width, offset, trigger delay) interact unpredictably
//! with a physical target, so a campaign explores the whole parameter space:
//! every point in the Cartesian product of the configured axes is tried a
//! fixed number of times, each trial is labeled with exactly one
//! [`TrialOutcome`](outcomes::TrialOutcome), and the labeled records are kept
//! for later analysis. The hardware (scope and device under test) stays
//! behind the [`Bench`](harness::Bench) trait, and per-trial failures are
//! labels, never sweep-terminating errors.

#![deny(clippy::unwrap_used)]

pub mod classify;
pub mod config;
pub mod error;
pub mod grid;
pub mod harness;
pub mod outcomes;
pub mod range;
pub mod recovery;
pub mod results;
pub mod state;
pub mod sweep;

pub use error::{Error, Result};
