// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Implements the state machine for a glitch bench. This state machine
//! represents the states a scope/target pair moves through during one trial
//! and the transitions between those states, so that a bench implementation
//! can reject out-of-order driving instead of producing garbage data.

use anyhow::Result;
use rust_fsm::*;

state_machine! {
    derive(Debug)
    pub GlitchBench(Idle)

    Idle => {
        Reset => Idle,
        Arm => Armed,
    },
    Armed => {
        Reset => Armed,
        Stimulus => Armed,
        Capture => Stopped,
    },
    Stopped => {
        Reset => Stopped,
        Read => Idle,
    }
}

pub struct BenchState {
    machine: StateMachine<GlitchBench>,
}

impl BenchState {
    pub fn new() -> Self {
        Self {
            machine: StateMachine::new(),
        }
    }

    /// Consume one protocol input to trigger a state transition in the
    /// machine
    ///
    /// Bench implementations should call this at the top of each protocol
    /// method (`arm`, `reset_target`, `write`, `capture`, `read_response`)
    /// with the corresponding input; an error means the caller is driving
    /// the bench out of order and the trial data cannot be trusted.
    pub fn consume(&mut self, input: GlitchBenchInput) -> Result<Option<()>> {
        Ok(self.machine.consume(&input)?)
    }

    /// The current lifecycle state
    pub fn state(&self) -> &GlitchBenchState {
        self.machine.state()
    }
}

impl Default for BenchState {
    fn default() -> Self {
        Self::new()
    }
}
