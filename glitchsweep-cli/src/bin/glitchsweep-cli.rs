// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Parser;
use glitchsweep::{config::InstrumentConfig, outcomes::TrialOutcome};
use glitchsweep_cli::{args::Args, campaign::CampaignBuilder};
use std::io::stderr;
use tracing::trace;
use tracing_subscriber::{fmt, prelude::*, registry};

/// Turn the literal two-character sequence `\n` in a shell argument into a
/// newline, since banners and stimuli usually end in one
fn unescape(s: String) -> String {
    s.replace("\\n", "\n")
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    registry()
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_filter(args.log_level),
        )
        .init();

    trace!("Setting up campaign with args: {:?}", args);

    let mut builder = CampaignBuilder::default();

    args.axis.into_iter().for_each(|a| {
        builder.axis(a.axis);
    });

    builder
        .repeats(args.repeats)
        .policy(args.recovery_policy)
        .success_marker(args.success_marker)
        .seed(args.seed)
        .instrument(InstrumentConfig::default().with_repeat(args.glitch_repeat));

    if let Some(banner) = args.boot_banner {
        builder.boot_banner(unescape(banner));
    }

    if let Some(stimulus) = args.stimulus {
        builder.stimulus(unescape(stimulus).into_bytes());
    }

    if let Some(output) = args.output {
        builder.output(output);
    }

    let results = builder.build()?.launch()?;

    println!("Done glitching");
    for outcome in TrialOutcome::ALL {
        println!("{:>8}: {}", outcome.to_string(), results.count(outcome));
    }

    Ok(())
}
