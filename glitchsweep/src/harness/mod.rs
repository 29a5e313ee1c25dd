// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! The trial harness: the boundary to the physical bench
//!
//! The [`Bench`] trait stands in for the scope/target pair; everything
//! behind it (USB transport, FPGA glitch generator, UART wiring) is outside
//! this crate. [`TrialRunner`] drives a bench through one complete trial and
//! always produces a labeled [`Trial`]: device timeouts, garbled responses,
//! and even transport failures become outcome labels after recovery is
//! attempted, because a flaky target must never abort an automated search.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, trace};

use crate::{
    classify::Classifier,
    config::InstrumentConfig,
    error::TrialError,
    grid::ParameterValues,
    outcomes::{Trial, TrialOutcome},
    recovery::RecoveryPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Whether an armed capture saw its trigger before the capture timeout
pub enum CaptureStatus {
    Complete,
    TimedOut,
}

/// One scope/target pair, driven through the per-trial protocol:
/// `configure`, `flush`, `arm`, then (depending on policy) `reset_target`
/// and/or `write`, then `capture` and `read_response`.
pub trait Bench {
    /// Apply one grid point's parameter values to the instrument
    fn configure(&mut self, parameters: &ParameterValues) -> Result<()>;

    /// Discard any pending target output
    fn flush(&mut self) -> Result<()>;

    /// Arm the capture so the next trigger fires the glitch
    fn arm(&mut self) -> Result<()>;

    /// Power-cycle or otherwise reboot the target
    fn reset_target(&mut self) -> Result<()>;

    /// Send a stimulus (e.g. a password attempt) to the target
    fn write(&mut self, stimulus: &[u8]) -> Result<()>;

    /// Wait for the armed capture to complete
    fn capture(&mut self) -> Result<CaptureStatus>;

    /// Read the target's response, waiting at most `timeout`
    fn read_response(&mut self, timeout: Duration) -> std::result::Result<String, TrialError>;
}

/// Drives a [`Bench`] through complete trials, labeling each one via the
/// injected [`Classifier`] and recovering the target per the injected
/// [`RecoveryPolicy`]. A `TrialRunner` composes directly into
/// [`Sweep::run`](crate::sweep::Sweep::run):
///
/// ```ignore
/// sweep.run(|point| runner.trial(point))?
/// ```
pub struct TrialRunner<B, C> {
    bench: B,
    classifier: C,
    policy: RecoveryPolicy,
    stimulus: Option<Vec<u8>>,
    read_timeout: Duration,
}

impl<B, C> TrialRunner<B, C>
where
    B: Bench,
    C: Classifier,
{
    pub fn new(bench: B, classifier: C) -> Self {
        Self {
            bench,
            classifier,
            policy: RecoveryPolicy::default(),
            stimulus: None,
            read_timeout: Duration::from_secs_f64(InstrumentConfig::DEFAULT_READ_TIMEOUT_SECONDS),
        }
    }

    /// Set the recovery policy
    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the stimulus written to the target each trial
    pub fn with_stimulus<S>(mut self, stimulus: S) -> Self
    where
        S: Into<Vec<u8>>,
    {
        self.stimulus = Some(stimulus.into());
        self
    }

    /// Set the response read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn bench(&self) -> &B {
        &self.bench
    }

    pub fn bench_mut(&mut self) -> &mut B {
        &mut self.bench
    }

    pub fn into_inner(self) -> B {
        self.bench
    }

    /// Run one complete trial at the given grid point. Always returns a
    /// labeled trial: transport failures are logged, recovery is attempted,
    /// and the trial is labeled [`TrialOutcome::Timeout`].
    pub fn trial(&mut self, parameters: &ParameterValues) -> Trial {
        match self.try_trial(parameters) {
            Ok(trial) => trial,
            Err(e) => {
                error!("Trial at {} failed: {:#}", parameters, e);

                if let Err(e) = self.bench.reset_target() {
                    debug!("Recovery reset also failed: {:#}", e);
                }

                TrialOutcome::Timeout.into()
            }
        }
    }

    fn try_trial(&mut self, parameters: &ParameterValues) -> Result<Trial> {
        self.bench.configure(parameters)?;
        self.bench.flush()?;
        self.bench.arm()?;

        if matches!(self.policy, RecoveryPolicy::ResetOnArm) {
            self.bench.reset_target()?;
        }

        if let Some(stimulus) = &self.stimulus {
            self.bench.write(stimulus)?;
        }

        if self.bench.capture()? == CaptureStatus::TimedOut {
            debug!("Capture timed out at {}", parameters);

            if matches!(self.policy, RecoveryPolicy::ResetOnTimeout) {
                self.bench.reset_target()?;
            }

            // Drain whatever the target managed to produce for the record
            let response = self.bench.read_response(self.read_timeout).unwrap_or_default();
            return Ok(Trial::new(TrialOutcome::Timeout, response));
        }

        let response = match self.bench.read_response(self.read_timeout) {
            Ok(response) => response,
            Err(TrialError::DeviceTimeout) => {
                debug!("No response from target at {}", parameters);

                if matches!(self.policy, RecoveryPolicy::ResetOnTimeout) {
                    self.bench.reset_target()?;
                }

                return Ok(TrialOutcome::Timeout.into());
            }
            Err(TrialError::UnexpectedResponse(raw)) => {
                debug!("Garbled response from target at {}", parameters);
                return Ok(Trial::new(TrialOutcome::Reset, raw));
            }
        };

        let outcome = self.classifier.classify(&response);

        trace!("Classified response {:?} as {}", response, outcome);

        Ok(Trial::new(outcome, response))
    }
}
