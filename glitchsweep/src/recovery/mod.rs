// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Recovery strategies applied around each physical trial
//!
//! A glitched target can be left hung or corrupted, so something must put it
//! back into a known state before the next trial. When that happens is
//! campaign policy and differs between target firmwares, so the strategy is
//! injected into the trial runner rather than baked into it.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// When the trial runner resets the target
pub enum RecoveryPolicy {
    /// Reset the target after arming, every trial. The boot itself is the
    /// stimulus, and no trial depends on state left by the previous one.
    ResetOnArm,
    /// Reset the target only after a capture timeout signals a crash. Used
    /// when the target accepts a stimulus per trial and resetting every time
    /// would be needlessly slow.
    ResetOnTimeout,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::ResetOnArm
    }
}
