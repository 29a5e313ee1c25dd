// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Tests for the sweep engine's traversal and fail-fast guarantees

use anyhow::Result;
use std::collections::HashMap;

use glitchsweep::{
    config::ParameterDomain,
    error::Error,
    outcomes::TrialOutcome,
    range::{ParameterRange, SweepAxis},
    sweep::SweepBuilder,
};

#[test]
fn test_record_count_is_repeats_times_grid_size() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("width", ParameterRange::new(-20, 0, 1)))
        .axis(SweepAxis::new("offset", ParameterRange::new(-49, -35, 1)))
        .repeats_per_point(2)
        .build()?;

    assert_eq!(sweep.total_trials(), 21 * 15 * 2);

    let results = sweep.run(|_| TrialOutcome::Normal)?;

    assert_eq!(results.len(), 21 * 15 * 2);

    Ok(())
}

#[test]
fn test_runs_are_reproducible() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("width", ParameterRange::new(-12, -8, 1)))
        .axis(SweepAxis::new("offset", ParameterRange::new(-40, -35, 1)))
        .repeats_per_point(3)
        .build()?;

    let trial = |point: &glitchsweep::grid::ParameterValues| {
        if point.get("offset") == Some(-37) {
            TrialOutcome::Success
        } else {
            TrialOutcome::Normal
        }
    };

    let first = sweep.run(trial)?;
    let second = sweep.run(trial)?;

    assert_eq!(first, second);

    Ok(())
}

#[test]
fn test_every_grid_point_is_covered_exactly_repeats_times() -> Result<()> {
    let repeats = 3;
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("width", ParameterRange::new(-2, 0, 1)))
        .axis(SweepAxis::new("offset", ParameterRange::new(4, 10, 3)))
        .repeats_per_point(repeats)
        .build()?;

    let results = sweep.run(|_| TrialOutcome::Normal)?;

    let mut counts = HashMap::new();
    for record in &results {
        *counts
            .entry((
                record.parameters.get("width").expect("width value"),
                record.parameters.get("offset").expect("offset value"),
            ))
            .or_insert(0usize) += 1;
    }

    // offset enumerates 4, 7, 10
    assert_eq!(counts.len(), 3 * 3);
    for width in [-2, -1, 0] {
        for offset in [4, 7, 10] {
            assert_eq!(counts.get(&(width, offset)), Some(&repeats));
        }
    }

    Ok(())
}

#[test]
fn test_single_point_axis() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("ext_offset", ParameterRange::new(37, 37, 1)))
        .repeats_per_point(4)
        .build()?;

    let results = sweep.run(|_| TrialOutcome::Normal)?;

    assert_eq!(results.len(), 4);
    assert!(results
        .iter()
        .all(|record| record.parameters.get("ext_offset") == Some(37)));

    Ok(())
}

#[test]
fn test_success_records_land_at_expected_positions() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("offset", ParameterRange::new(-2, 0, 1)))
        .repeats_per_point(2)
        .build()?;

    let results = sweep.run(|point| {
        if point.get("offset") == Some(-1) {
            TrialOutcome::Success
        } else {
            TrialOutcome::Normal
        }
    })?;

    assert_eq!(results.len(), 6);
    assert_eq!(results.count(TrialOutcome::Success), 2);

    for (index, record) in results.iter().enumerate() {
        if matches!(index, 2 | 3) {
            assert_eq!(record.outcome, TrialOutcome::Success);
            assert_eq!(record.parameters.get("offset"), Some(-1));
        } else {
            assert_eq!(record.outcome, TrialOutcome::Normal);
        }
    }

    Ok(())
}

#[test]
fn test_all_timeouts_never_abort_the_sweep() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("width", ParameterRange::new(-5, 0, 1)))
        .axis(SweepAxis::new("offset", ParameterRange::new(-3, -1, 1)))
        .repeats_per_point(2)
        .build()?;

    let results = sweep.run(|_| TrialOutcome::Timeout)?;

    assert_eq!(results.len(), 6 * 3 * 2);
    assert_eq!(results.count(TrialOutcome::Timeout), results.len());

    Ok(())
}

#[test]
fn test_out_of_domain_axis_fails_before_any_trial() {
    let result = SweepBuilder::default()
        .axis(SweepAxis::new("offset", ParameterRange::new(-60, 0, 1)))
        .domain(ParameterDomain::CLOCK_GLITCH)
        .build();

    match result {
        Err(Error::ConfigurationOutOfRange {
            axis, value, min, max,
        }) => {
            assert_eq!(axis, "offset");
            assert_eq!(value, -60);
            assert_eq!((min, max), (-50, 50));
        }
        other => panic!("Expected ConfigurationOutOfRange, got {:?}", other),
    }
}

#[test]
fn test_empty_sweep_fails_fast_with_zero_trials() -> Result<()> {
    let sweep = SweepBuilder::default().build()?;

    let mut trials = 0;
    let error = sweep
        .run(|_| {
            trials += 1;
            TrialOutcome::Normal
        })
        .expect_err("no axes configured");

    assert_eq!(error, Error::EmptyAxes);
    assert_eq!(trials, 0);

    Ok(())
}

#[test]
fn test_zero_step_is_rejected() {
    let result = SweepBuilder::default()
        .axis(SweepAxis::new("width", ParameterRange::new(-5, 5, 0)))
        .build();

    assert!(matches!(result, Err(Error::InvalidRange { .. })));
}

#[test]
fn test_lazy_trials_can_be_abandoned() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("offset", ParameterRange::new(0, 99, 1)))
        .repeats_per_point(5)
        .build()?;

    let mut trials = 0;
    let records = sweep
        .trials(|_| {
            trials += 1;
            TrialOutcome::Normal
        })?
        .take(7)
        .collect::<Vec<_>>();

    assert_eq!(records.len(), 7);
    assert_eq!(trials, 7);

    Ok(())
}

#[test]
fn test_traversal_order_is_lexicographic() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("width", ParameterRange::new(0, 1, 1)))
        .axis(SweepAxis::new("offset", ParameterRange::new(10, 11, 1)))
        .repeats_per_point(1)
        .build()?;

    let results = sweep.run(|_| TrialOutcome::Normal)?;

    let order = results
        .iter()
        .map(|record| {
            (
                record.parameters.get("width").expect("width value"),
                record.parameters.get("offset").expect("offset value"),
            )
        })
        .collect::<Vec<_>>();

    assert_eq!(order, vec![(0, 10), (0, 11), (1, 10), (1, 11)]);

    Ok(())
}

#[test]
fn test_point_summaries_follow_sweep_order() -> Result<()> {
    let sweep = SweepBuilder::default()
        .axis(SweepAxis::new("offset", ParameterRange::new(-2, 0, 1)))
        .repeats_per_point(4)
        .build()?;

    let results = sweep.run(|point| {
        if point.get("offset") == Some(-1) {
            TrialOutcome::Success
        } else {
            TrialOutcome::Reset
        }
    })?;

    let summaries = results.point_summaries();

    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].parameters.get("offset"), Some(-2));
    assert_eq!(summaries[1].successes, 4);
    assert!((summaries[1].success_rate() - 1.0).abs() < f64::EPSILON);
    assert_eq!(summaries[2].resets, 4);
    assert_eq!(summaries[2].success_rate(), 0.0);

    Ok(())
}
