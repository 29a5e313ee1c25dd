// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Definitions of the outcomes a glitch trial can end in
//!
//! Every trial is assigned exactly one label. Hardware-level failures are
//! folded into these labels by the harness so that an unreliable target can
//! never abort a sweep.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
/// The label assigned to one trial
pub enum TrialOutcome {
    /// The glitch took effect: the success marker appeared in the response
    Success,
    /// The target reset during the trial without producing the marker
    Reset,
    /// The target behaved normally, the glitch had no observable effect
    Normal,
    /// The target crashed or produced no response within the timeout
    Timeout,
}

impl TrialOutcome {
    /// All labels, in reporting order
    pub const ALL: [TrialOutcome; 4] = [
        TrialOutcome::Success,
        TrialOutcome::Reset,
        TrialOutcome::Normal,
        TrialOutcome::Timeout,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The observation produced by one trial: the label plus the raw target
/// output it was derived from
pub struct Trial {
    pub outcome: TrialOutcome,
    pub response: String,
}

impl Trial {
    pub fn new<S>(outcome: TrialOutcome, response: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            outcome,
            response: response.into(),
        }
    }
}

impl From<TrialOutcome> for Trial {
    /// A bare label is a trial with no recorded response, which lets simple
    /// closures serve as trial functions
    fn from(outcome: TrialOutcome) -> Self {
        Self {
            outcome,
            response: String::new(),
        }
    }
}
