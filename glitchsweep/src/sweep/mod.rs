// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! The exhaustive grid sweep engine
//!
//! A [`Sweep`] traverses every point of the grid spanned by its axes,
//! invokes a caller-supplied trial function `repeats_per_point` times per
//! point, and appends one [`TrialRecord`] per invocation. The trial function
//! is infallible by contract: crashes and timeouts at the hardware level are
//! outcome labels, not errors, so partial failure never aborts the search.
//! Only configuration problems fail a sweep, and they fail it before the
//! first trial runs.

use derive_builder::Builder;
use tracing::{debug, info, trace};

use crate::{
    config::ParameterDomain,
    error::{Error, Result},
    grid::{GridIter, ParameterValues},
    outcomes::Trial,
    range::SweepAxis,
    results::{SweepResults, TrialRecord},
};

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate", error = "Error"))]
/// An exhaustive sweep over a Cartesian product of parameter axes
pub struct Sweep {
    #[builder(setter(each(name = "axis")), default)]
    /// The axes to sweep, outer-to-inner; the last axis varies fastest
    axes: Vec<SweepAxis>,
    #[builder(default = "Sweep::DEFAULT_REPEATS")]
    /// How many trials to run at each grid point
    repeats_per_point: usize,
    #[builder(default, setter(strip_option))]
    /// The instrument's supported parameter domain, validated before any
    /// trial executes
    domain: Option<ParameterDomain>,
}

impl SweepBuilder {
    fn validate(&self) -> Result<()> {
        if let Some(axes) = &self.axes {
            validate_sweep(
                axes,
                self.repeats_per_point.unwrap_or(Sweep::DEFAULT_REPEATS),
                self.domain.as_ref().and_then(|domain| domain.as_ref()),
            )?;
        }
        Ok(())
    }
}

impl Sweep {
    /// The default per-point repeat count used to estimate a success rate
    pub const DEFAULT_REPEATS: usize = 5;

    pub fn axes(&self) -> &[SweepAxis] {
        &self.axes
    }

    pub fn repeats_per_point(&self) -> usize {
        self.repeats_per_point
    }

    /// Total number of trials the sweep will run:
    /// `repeats_per_point * product(len(axis))`
    pub fn total_trials(&self) -> usize {
        self.repeats_per_point * GridIter::new(&self.axes).total()
    }

    /// Run the full sweep eagerly and return the accumulated results
    pub fn run<F, T>(&self, trial_fn: F) -> Result<SweepResults>
    where
        F: FnMut(&ParameterValues) -> T,
        T: Into<Trial>,
    {
        info!(
            "Sweeping {} axes, {} trials total",
            self.axes.len(),
            self.total_trials()
        );

        let results = self.trials(trial_fn)?.collect::<SweepResults>();

        info!("Sweep complete with {} records", results.len());

        Ok(results)
    }

    /// The same traversal as [`Sweep::run`] as a lazy, finite iterator of
    /// records, so a caller can stop consuming between trials. Validation
    /// still happens up front: a configuration error is returned before the
    /// trial function is ever invoked.
    pub fn trials<F, T>(&self, trial_fn: F) -> Result<Trials<F>>
    where
        F: FnMut(&ParameterValues) -> T,
        T: Into<Trial>,
    {
        validate_sweep(&self.axes, self.repeats_per_point, self.domain.as_ref())?;

        Ok(Trials {
            grid: GridIter::new(&self.axes),
            repeats: self.repeats_per_point,
            remaining: 0,
            point: None,
            trial_fn,
        })
    }
}

/// Check a sweep configuration without running anything. Fails on an empty
/// axis list, a zero repeat count, an unenumerable range, or an axis whose
/// extreme points leave the supported domain.
fn validate_sweep(
    axes: &[SweepAxis],
    repeats_per_point: usize,
    domain: Option<&ParameterDomain>,
) -> Result<()> {
    if axes.is_empty() {
        return Err(Error::EmptyAxes);
    }

    if repeats_per_point < 1 {
        return Err(Error::InvalidRepeats);
    }

    for axis in axes {
        if !axis.range.is_valid() {
            let reason = if axis.range.step == 0 {
                "step is zero".to_string()
            } else {
                "step moves away from max".to_string()
            };
            return Err(Error::InvalidRange {
                axis: axis.name.clone(),
                range: axis.range,
                reason,
            });
        }

        if let Some(domain) = domain {
            domain.validate_axis(axis)?;
        }
    }

    Ok(())
}

/// Lazy iterator over the records of a running sweep. Obtained from
/// [`Sweep::trials`]; dropping it abandons the sweep between trials.
pub struct Trials<F> {
    grid: GridIter,
    repeats: usize,
    remaining: usize,
    point: Option<ParameterValues>,
    trial_fn: F,
}

impl<F, T> Iterator for Trials<F>
where
    F: FnMut(&ParameterValues) -> T,
    T: Into<Trial>,
{
    type Item = TrialRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            let point = self.grid.next()?;
            debug!("Sweeping point {}", point);
            self.point = Some(point);
            self.remaining = self.repeats;
        }

        self.remaining -= 1;

        let point = self.point.as_ref()?;
        let trial: Trial = (self.trial_fn)(point).into();

        trace!("Trial at {} ended in {}", point, trial.outcome);

        Some(TrialRecord {
            parameters: point.clone(),
            outcome: trial.outcome,
            response: trial.response,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len() * self.repeats + self.remaining;
        (remaining, Some(remaining))
    }
}

impl<F, T> ExactSizeIterator for Trials<F>
where
    F: FnMut(&ParameterValues) -> T,
    T: Into<Trial>,
{
}
