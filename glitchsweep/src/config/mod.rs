// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Instrument-side configuration for a glitch campaign
//!
//! These settings describe the glitch generator itself: where its input
//! clock comes from, how the glitch is combined with that clock, what
//! triggers it, how many cycles it repeats for, and the parameter domain the
//! hardware supports. Sweep axes are validated against the domain before any
//! trial runs.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    error::{Error, Result},
    range::SweepAxis,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// The clock the glitch generator phase-shifts against
pub enum ClockSource {
    /// The instrument's own clock generator, also fed to the target
    #[default]
    Clkgen,
    /// A clock recovered from the target
    Target,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// How the glitch is combined into the clock presented to the target
pub enum GlitchOutput {
    /// XOR the glitch into the clock, the usual choice for clock glitching
    #[default]
    ClockXor,
    /// OR the glitch into the clock
    ClockOr,
    /// Output the enable line itself
    Enable,
    /// Output only the glitch pulses
    GlitchOnly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
/// What fires the glitch
pub enum TriggerSource {
    /// A single shot on the external trigger line after arming
    #[default]
    ExtSingle,
    /// Every external trigger edge while armed
    ExtContinuous,
    /// Fired by software
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// The parameter values the instrument accepts on any axis
pub struct ParameterDomain {
    pub min: i64,
    pub max: i64,
}

impl ParameterDomain {
    /// The width/offset domain of the clock glitch generator, in percent of
    /// a clock period
    pub const CLOCK_GLITCH: Self = Self { min: -50, max: 50 };

    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Check that every value the axis will apply stays inside the domain.
    /// The extreme applied values are the axis's first and last points, so
    /// checking those two suffices.
    pub fn validate_axis(&self, axis: &SweepAxis) -> Result<()> {
        for value in [axis.range.min, axis.range.last_value()] {
            if !self.contains(value) {
                return Err(Error::ConfigurationOutOfRange {
                    axis: axis.name.clone(),
                    value,
                    min: self.min,
                    max: self.max,
                });
            }
        }
        Ok(())
    }
}

impl Default for ParameterDomain {
    fn default() -> Self {
        Self::CLOCK_GLITCH
    }
}

#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(error = "Error"))]
/// Settings applied to the glitch generator for a whole campaign. Per-trial
/// values (width, offset, trigger delay) come from the sweep axes instead.
pub struct InstrumentConfig {
    #[builder(default)]
    pub clock_source: ClockSource,
    #[builder(default)]
    pub output: GlitchOutput,
    #[builder(default)]
    pub trigger_source: TriggerSource,
    #[builder(default = "InstrumentConfig::DEFAULT_REPEAT")]
    /// How many consecutive clock cycles to glitch. Higher values make
    /// glitches land more easily but crash the target more often.
    pub repeat: u32,
    #[builder(default = "InstrumentConfig::DEFAULT_CAPTURE_TIMEOUT_SECONDS")]
    /// How long to wait for the armed capture to complete, in seconds
    pub capture_timeout: f64,
    #[builder(default = "InstrumentConfig::DEFAULT_READ_TIMEOUT_SECONDS")]
    /// How long to wait for target output after a capture, in seconds
    pub read_timeout: f64,
    #[builder(default)]
    /// The parameter domain the instrument supports on each axis
    pub domain: ParameterDomain,
}

impl InstrumentConfig {
    pub const DEFAULT_REPEAT: u32 = 1;
    pub const DEFAULT_CAPTURE_TIMEOUT_SECONDS: f64 = 2.0;
    pub const DEFAULT_READ_TIMEOUT_SECONDS: f64 = 0.1;

    /// Set the number of consecutive cycles to glitch
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the capture timeout in seconds
    pub fn with_capture_timeout_seconds(mut self, seconds: f64) -> Self {
        self.capture_timeout = seconds;
        self
    }

    /// Set the response read timeout in seconds
    pub fn with_read_timeout_seconds(mut self, seconds: f64) -> Self {
        self.read_timeout = seconds;
        self
    }

    /// Set the supported parameter domain
    pub fn with_domain(mut self, domain: ParameterDomain) -> Self {
        self.domain = domain;
        self
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        InstrumentConfigBuilder::default()
            .build()
            .expect("Default instrument configuration is valid")
    }
}
