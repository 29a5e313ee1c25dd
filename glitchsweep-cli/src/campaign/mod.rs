// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Campaign orchestration: wires a sweep, a trial runner, and the simulated
//! bench together, streams records to disk, and reports where the successes
//! landed

use anyhow::{Context, Error, Result};
use derive_builder::Builder;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    time::Duration,
};
use tracing::{debug, info};

use glitchsweep::{
    classify::MarkerClassifier,
    config::InstrumentConfig,
    harness::TrialRunner,
    outcomes::TrialOutcome,
    range::SweepAxis,
    recovery::RecoveryPolicy,
    results::SweepResults,
    sweep::SweepBuilder,
};

use crate::bench::{Firmware, SimBench};

#[derive(Builder)]
#[builder(build_fn(validate = "Self::validate", error = "Error"))]
/// One glitch campaign against the simulated bench
pub struct Campaign {
    #[builder(setter(each(name = "axis")), default)]
    axes: Vec<SweepAxis>,
    #[builder(default = "Campaign::DEFAULT_REPEATS")]
    repeats: usize,
    #[builder(default)]
    policy: RecoveryPolicy,
    #[builder(default = "Campaign::DEFAULT_SUCCESS_MARKER.to_string()")]
    success_marker: String,
    #[builder(setter(into, strip_option), default)]
    boot_banner: Option<String>,
    #[builder(setter(into, strip_option), default)]
    stimulus: Option<Vec<u8>>,
    #[builder(default = "Campaign::DEFAULT_SEED")]
    seed: u64,
    #[builder(setter(into, strip_option), default)]
    output: Option<PathBuf>,
    #[builder(default)]
    instrument: InstrumentConfig,
}

impl CampaignBuilder {
    fn validate(&self) -> Result<()> {
        if let Some(repeats) = self.repeats {
            anyhow::ensure!(repeats >= 1, "repeats must be at least 1");
        }
        Ok(())
    }
}

impl Campaign {
    pub const DEFAULT_REPEATS: usize = 5;
    pub const DEFAULT_SUCCESS_MARKER: &'static str = "1234";
    pub const DEFAULT_SEED: u64 = 0x1234;
    /// How many of the best grid points to report after the sweep
    pub const TOP_POINTS: usize = 5;

    /// Run the campaign to completion and return the accumulated results
    pub fn launch(&self) -> Result<SweepResults> {
        // A stimulus means we are attacking the password check; otherwise
        // the target is the infinite-loop image and the reset is the trigger
        let firmware = if self.stimulus.is_some() {
            Firmware::password_check()
        } else {
            Firmware::infinite_loop()
        };

        info!(
            "Launching campaign: {} axes, {} repeats per point, {} policy",
            self.axes.len(),
            self.repeats,
            self.policy
        );

        // The password image's responses don't include the boot prompt (it
        // is flushed before capture), so only the loop image gets a default
        // banner for reset detection
        let banner = self.boot_banner.clone().or_else(|| {
            matches!(firmware, Firmware::InfiniteLoop { .. })
                .then(|| firmware.boot_output().to_string())
        });

        let bench = SimBench::new(self.seed, self.instrument.clone()).with_firmware(firmware);

        let mut classifier = MarkerClassifier::new(&self.success_marker);

        if let Some(banner) = banner {
            classifier = classifier.with_boot_banner(banner);
        }

        let mut runner = TrialRunner::new(bench, classifier)
            .with_policy(self.policy)
            .with_read_timeout(Duration::from_secs_f64(self.instrument.read_timeout));

        if let Some(stimulus) = &self.stimulus {
            runner = runner.with_stimulus(stimulus.clone());
        }

        let sweep = SweepBuilder::default()
            .axes(self.axes.clone())
            .repeats_per_point(self.repeats)
            .domain(self.instrument.domain)
            .build()?;

        let mut writer = self
            .output
            .as_ref()
            .map(|path| {
                File::create(path)
                    .map(BufWriter::new)
                    .with_context(|| format!("Couldn't create output file {}", path.display()))
            })
            .transpose()?;

        let mut records = Vec::with_capacity(sweep.total_trials());

        for record in sweep.trials(|point| runner.trial(point))? {
            if let Some(writer) = writer.as_mut() {
                serde_json::to_writer(&mut *writer, &record)?;
                writer.write_all(b"\n")?;
            }
            records.push(record);
        }

        if let Some(writer) = writer.as_mut() {
            writer.flush()?;
        }

        let results = records.into_iter().collect::<SweepResults>();

        for outcome in TrialOutcome::ALL {
            info!("{}: {}", outcome, results.count(outcome));
        }

        let mut summaries = results.point_summaries();
        summaries.sort_by(|a, b| {
            b.success_rate()
                .partial_cmp(&a.success_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for summary in summaries
            .iter()
            .take(Self::TOP_POINTS)
            .filter(|summary| summary.successes > 0)
        {
            info!(
                "{}: {}/{} successes",
                summary.parameters, summary.successes, summary.trials
            );
        }

        debug!("Campaign done with {} records", results.len());

        Ok(results)
    }
}
