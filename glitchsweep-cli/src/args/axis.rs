// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Error, Result};
use glitchsweep::range::{ParameterRange, SweepAxis};
use std::str::FromStr;

#[derive(Debug, Clone)]
/// A sweep axis given on the command line as `NAME:MIN:MAX:STEP`
pub struct AxisArg {
    pub axis: SweepAxis,
}

impl FromStr for AxisArg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split(':').collect::<Vec<_>>();

        match (parts.first(), parts.get(1), parts.get(2), parts.get(3)) {
            (Some(name), Some(min), Some(max), Some(step)) if parts.len() == 4 => Ok(Self {
                axis: SweepAxis::new(
                    *name,
                    ParameterRange::new(min.parse()?, max.parse()?, step.parse()?),
                ),
            }),
            _ => bail!("Axis argument {} not of the form 'NAME:MIN:MAX:STEP'", s),
        }
    }
}
