// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

pub mod axis;

use axis::AxisArg;
use clap::Parser;
use glitchsweep::recovery::RecoveryPolicy;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(short, long, required = true)]
    /// An axis to sweep, of the form NAME:MIN:MAX:STEP (e.g. width:-20:0:1).
    /// May be given multiple times; axes are swept outer-to-inner in the
    /// order given, so the last axis varies fastest.
    pub axis: Vec<AxisArg>,
    #[arg(short, long, default_value_t = 5)]
    /// How many trials to run at each grid point. Per-point repeats estimate
    /// the success rate at that point.
    pub repeats: usize,
    #[arg(short = 'p', long, default_value_t = RecoveryPolicy::ResetOnArm)]
    /// When to reset the target: reset_on_arm resets unconditionally every
    /// trial, reset_on_timeout resets only after a capture timeout signals a
    /// crash
    pub recovery_policy: RecoveryPolicy,
    #[arg(short = 'm', long, default_value = "1234")]
    /// Substring of the response that marks a successful glitch
    pub success_marker: String,
    #[arg(short, long)]
    /// The banner the target prints on boot. Output continuing past the
    /// banner is classified as an unwanted reset. "\n" in the value is
    /// interpreted as a newline. Defaults to the simulated firmware's own
    /// banner.
    pub boot_banner: Option<String>,
    #[arg(short = 'i', long)]
    /// A stimulus written to the target each trial (e.g. a password
    /// attempt). "\n" in the value is interpreted as a newline. Selects the
    /// simulated password-check firmware.
    pub stimulus: Option<String>,
    #[arg(short, long, default_value_t = 0x1234)]
    /// Seed for the simulated bench's RNG, so campaigns are reproducible
    pub seed: u64,
    #[arg(short, long)]
    /// Path to write one JSON record per trial. The file is truncated first.
    pub output: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    /// How many consecutive clock cycles to glitch. Higher values glitch
    /// more easily but crash the target more often.
    pub glitch_repeat: u32,
    #[arg(short, long, default_value_t = Level::ERROR)]
    /// Logging level
    pub log_level: Level,
}
