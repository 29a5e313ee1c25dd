// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! A deterministic simulated bench
//!
//! `SimBench` stands in for the scope/target pair so campaigns can run
//! without hardware: a seeded RNG decides whether a glitch lands based on a
//! configurable success window in parameter space, and wide glitches crash
//! the simulated target more often as the glitch repeat count grows. The
//! bench enforces the trial lifecycle state machine, so a driver that calls
//! the protocol out of order gets an error instead of garbage data.

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

use glitchsweep::{
    config::InstrumentConfig,
    error::TrialError,
    grid::ParameterValues,
    harness::{Bench, CaptureStatus},
    state::{BenchState, GlitchBenchInput},
};

#[derive(Debug, Clone)]
/// The firmware image the simulated target runs, mirroring the two classic
/// glitch training targets
pub enum Firmware {
    /// Prints a banner on boot, then spins forever; a landed glitch skips
    /// the infinite loop and the marker is printed
    InfiniteLoop { banner: String, marker: String },
    /// Prompts for a password each boot and answers every attempt; a landed
    /// glitch skips the comparison and accepts anything
    PasswordCheck {
        prompt: String,
        password: String,
        accept: String,
        reject: String,
    },
}

impl Firmware {
    pub fn infinite_loop() -> Self {
        Self::InfiniteLoop {
            banner: "hello\nA".to_string(),
            marker: "1234".to_string(),
        }
    }

    pub fn password_check() -> Self {
        Self::PasswordCheck {
            prompt: "Password:".to_string(),
            password: "touch".to_string(),
            accept: "Welcome\n".to_string(),
            reject: "Denied\n".to_string(),
        }
    }

    /// What the target prints when it boots
    pub fn boot_output(&self) -> &str {
        match self {
            Self::InfiniteLoop { banner, .. } => banner,
            Self::PasswordCheck { prompt, .. } => prompt,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// The region of parameter space where the simulated glitch can land, and
/// how often it lands there
pub struct SuccessWindow {
    constraints: Vec<(String, i64, i64)>,
    rate: f64,
}

impl SuccessWindow {
    pub fn new(rate: f64) -> Self {
        Self {
            constraints: Vec::new(),
            rate: rate.clamp(0.0, 1.0),
        }
    }

    /// Constrain the window on one axis; a point missing a constrained axis
    /// is outside the window
    pub fn with_axis<S>(mut self, name: S, min: i64, max: i64) -> Self
    where
        S: Into<String>,
    {
        self.constraints.push((name.into(), min, max));
        self
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn contains(&self, parameters: &ParameterValues) -> bool {
        self.constraints.iter().all(|(name, min, max)| {
            parameters
                .get(name)
                .map(|value| *min <= value && value <= *max)
                .unwrap_or(false)
        })
    }
}

/// A simulated scope/target pair implementing [`Bench`]
pub struct SimBench {
    config: InstrumentConfig,
    rng: StdRng,
    state: BenchState,
    firmware: Firmware,
    window: SuccessWindow,
    crash_threshold: i64,
    crash_probability: f64,
    parameters: Option<ParameterValues>,
    buffer: String,
    pending_stimulus: Option<Vec<u8>>,
    hung: bool,
}

impl SimBench {
    /// Width at or below which a glitch starts to risk crashing the target
    pub const DEFAULT_CRASH_THRESHOLD: i64 = -15;
    pub const DEFAULT_CRASH_PROBABILITY: f64 = 0.05;

    pub fn new(seed: u64, config: InstrumentConfig) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            state: BenchState::new(),
            firmware: Firmware::infinite_loop(),
            window: SuccessWindow::new(0.8)
                .with_axis("width", -12, -8)
                .with_axis("offset", -40, -35),
            crash_threshold: Self::DEFAULT_CRASH_THRESHOLD,
            crash_probability: Self::DEFAULT_CRASH_PROBABILITY,
            parameters: None,
            buffer: String::new(),
            pending_stimulus: None,
            hung: false,
        }
    }

    /// Set the firmware image the target runs
    pub fn with_firmware(mut self, firmware: Firmware) -> Self {
        self.firmware = firmware;
        self
    }

    /// Set the region of parameter space where glitches land
    pub fn with_success_window(mut self, window: SuccessWindow) -> Self {
        self.window = window;
        self
    }

    /// Set the width at or below which glitches risk crashing the target
    pub fn with_crash_threshold(mut self, threshold: i64) -> Self {
        self.crash_threshold = threshold;
        self
    }

    /// Set the per-repeat crash probability for too-wide glitches
    pub fn with_crash_probability(mut self, probability: f64) -> Self {
        self.crash_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn firmware(&self) -> &Firmware {
        &self.firmware
    }

    fn glitch_lands(&mut self, parameters: &ParameterValues) -> bool {
        self.window.contains(parameters) && self.rng.gen_bool(self.window.rate())
    }

    fn target_crashes(&mut self, parameters: &ParameterValues) -> bool {
        let wide = parameters
            .get("width")
            .map(|width| width <= self.crash_threshold)
            .unwrap_or(false);

        wide && self
            .rng
            .gen_bool((self.crash_probability * self.config.repeat as f64).min(1.0))
    }
}

impl Bench for SimBench {
    fn configure(&mut self, parameters: &ParameterValues) -> Result<()> {
        for (name, value) in parameters.iter() {
            if !self.config.domain.contains(value) {
                bail!(
                    "Setting {} to {} is outside the instrument domain [{}, {}]",
                    name,
                    value,
                    self.config.domain.min,
                    self.config.domain.max
                );
            }
        }

        self.parameters = Some(parameters.clone());

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.buffer.clear();
        Ok(())
    }

    fn arm(&mut self) -> Result<()> {
        self.state.consume(GlitchBenchInput::Arm)?;
        Ok(())
    }

    fn reset_target(&mut self) -> Result<()> {
        self.state.consume(GlitchBenchInput::Reset)?;
        self.hung = false;
        self.pending_stimulus = None;
        self.buffer.push_str(self.firmware.boot_output());
        Ok(())
    }

    fn write(&mut self, stimulus: &[u8]) -> Result<()> {
        self.state.consume(GlitchBenchInput::Stimulus)?;
        if !self.hung {
            self.pending_stimulus = Some(stimulus.to_vec());
        }
        Ok(())
    }

    fn capture(&mut self) -> Result<CaptureStatus> {
        self.state.consume(GlitchBenchInput::Capture)?;

        let parameters = self
            .parameters
            .clone()
            .context("Capture without configured parameters")?;

        let landed = self.glitch_lands(&parameters);
        let crashed = !landed && self.target_crashes(&parameters);

        match self.firmware.clone() {
            Firmware::InfiniteLoop { banner, marker } => {
                if landed {
                    self.buffer.push_str(&marker);
                } else if crashed {
                    // The watchdog reboots the target and the banner shows
                    // up a second time
                    self.buffer.push_str(&banner);
                }
                Ok(CaptureStatus::Complete)
            }
            Firmware::PasswordCheck {
                password,
                accept,
                reject,
                ..
            } => {
                if crashed {
                    self.hung = true;
                    return Ok(CaptureStatus::TimedOut);
                }

                let attempt = self.pending_stimulus.take();
                let correct = attempt
                    .as_deref()
                    .map(|attempt| attempt == format!("{}\n", password).as_bytes())
                    .unwrap_or(false);

                if landed || correct {
                    self.buffer.push_str(&accept);
                } else {
                    self.buffer.push_str(&reject);
                }

                Ok(CaptureStatus::Complete)
            }
        }
    }

    fn read_response(&mut self, _timeout: Duration) -> std::result::Result<String, TrialError> {
        self.state
            .consume(GlitchBenchInput::Read)
            .map_err(|e| TrialError::UnexpectedResponse(format!("{e}")))?;

        if self.buffer.is_empty() {
            return Err(TrialError::DeviceTimeout);
        }

        Ok(std::mem::take(&mut self.buffer))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use glitchsweep::{
        classify::MarkerClassifier, harness::TrialRunner, outcomes::TrialOutcome,
        recovery::RecoveryPolicy,
    };

    fn point(width: i64, offset: i64) -> ParameterValues {
        ParameterValues::new(vec![
            ("width".to_string(), width),
            ("offset".to_string(), offset),
        ])
    }

    #[test]
    fn test_capture_before_arm_is_rejected() {
        let mut bench = SimBench::new(0, InstrumentConfig::default());
        bench.configure(&point(-10, -38)).expect("in domain");
        assert!(bench.capture().is_err());
    }

    #[test]
    fn test_out_of_domain_configure_is_rejected() {
        let mut bench = SimBench::new(0, InstrumentConfig::default());
        assert!(bench.configure(&point(-60, 0)).is_err());
    }

    #[test]
    fn test_glitch_lands_inside_certain_window() {
        let bench = SimBench::new(7, InstrumentConfig::default()).with_success_window(
            SuccessWindow::new(1.0)
                .with_axis("width", -10, -10)
                .with_axis("offset", -38, -38),
        );

        let classifier = MarkerClassifier::new("1234").with_boot_banner("hello\nA");
        let mut runner =
            TrialRunner::new(bench, classifier).with_policy(RecoveryPolicy::ResetOnArm);

        assert_eq!(runner.trial(&point(-10, -38)).outcome, TrialOutcome::Success);
        assert_eq!(runner.trial(&point(-1, -38)).outcome, TrialOutcome::Normal);
    }

    #[test]
    fn test_password_glitch_prints_welcome() {
        let bench = SimBench::new(7, InstrumentConfig::default())
            .with_firmware(Firmware::password_check())
            .with_success_window(SuccessWindow::new(1.0).with_axis("ext_offset", 42, 42));

        let classifier = MarkerClassifier::new("Welcome");
        let mut runner = TrialRunner::new(bench, classifier)
            .with_policy(RecoveryPolicy::ResetOnTimeout)
            .with_stimulus(b"x\n".to_vec());

        // The bench starts unarmed with nothing buffered, so boot it once
        runner.bench_mut().reset_target().expect("reset succeeds");

        let miss = runner.trial(&ParameterValues::new(vec![("ext_offset".to_string(), 0)]));
        assert_eq!(miss.outcome, TrialOutcome::Normal);

        let hit = runner.trial(&ParameterValues::new(vec![("ext_offset".to_string(), 42)]));
        assert_eq!(hit.outcome, TrialOutcome::Success);
        assert!(hit.response.contains("Welcome"));
    }

    #[test]
    fn test_correct_password_without_glitch() {
        let bench = SimBench::new(7, InstrumentConfig::default())
            .with_firmware(Firmware::password_check())
            .with_success_window(SuccessWindow::new(0.0));

        let mut runner = TrialRunner::new(bench, MarkerClassifier::new("Welcome"))
            .with_policy(RecoveryPolicy::ResetOnTimeout)
            .with_stimulus(b"touch\n".to_vec());

        runner.bench_mut().reset_target().expect("reset succeeds");

        let trial = runner.trial(&ParameterValues::new(vec![("ext_offset".to_string(), 0)]));
        assert_eq!(trial.outcome, TrialOutcome::Success);
    }
}
