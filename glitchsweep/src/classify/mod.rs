// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Response classification
//!
//! Mapping a raw target response to a [`TrialOutcome`] is campaign policy,
//! not engine logic, so it lives behind the [`Classifier`] trait and is
//! injected into the harness. [`MarkerClassifier`] implements the common
//! policy for targets that print a known marker when the glitch lands.

use crate::outcomes::TrialOutcome;

/// Classification policy: assign exactly one label to a raw response
pub trait Classifier {
    fn classify(&self, response: &str) -> TrialOutcome;
}

impl<C> Classifier for &C
where
    C: Classifier,
{
    fn classify(&self, response: &str) -> TrialOutcome {
        (**self).classify(response)
    }
}

#[derive(Debug, Clone)]
/// Substring-marker classification: a response containing the success marker
/// is a [`TrialOutcome::Success`]. When a boot banner is configured, output
/// continuing past the banner means the target rebooted mid-trial and the
/// trial is a [`TrialOutcome::Reset`]; so is a response missing the banner
/// entirely. Everything else is [`TrialOutcome::Normal`].
pub struct MarkerClassifier {
    success_marker: String,
    boot_banner: Option<String>,
}

impl MarkerClassifier {
    /// More than one byte after the banner distinguishes a reboot from a
    /// stray trailing newline
    const RESET_TAIL_BYTES: usize = 1;

    pub fn new<S>(success_marker: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            success_marker: success_marker.into(),
            boot_banner: None,
        }
    }

    /// Set the banner the target prints when it boots, enabling reset
    /// detection
    pub fn with_boot_banner<S>(mut self, banner: S) -> Self
    where
        S: Into<String>,
    {
        self.boot_banner = Some(banner.into());
        self
    }

    pub fn success_marker(&self) -> &str {
        &self.success_marker
    }
}

impl Classifier for MarkerClassifier {
    fn classify(&self, response: &str) -> TrialOutcome {
        if response.contains(&self.success_marker) {
            return TrialOutcome::Success;
        }

        if let Some(banner) = &self.boot_banner {
            return match response.split_once(banner.as_str()) {
                Some((_, tail)) if tail.len() > Self::RESET_TAIL_BYTES => TrialOutcome::Reset,
                Some(_) => TrialOutcome::Normal,
                None => TrialOutcome::Reset,
            };
        }

        TrialOutcome::Normal
    }
}
