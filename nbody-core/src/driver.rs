// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! The driver loop (§6): repeatedly calls [`BsIterator::iterate`] until
//! `end_time`, invoking a sink callback at each logging point and matching
//! on [`StepOutcome`] to decide whether to retry, advance, or abort.
//!
//! `force_kind` from spec.md's `DriverConfig` field list has no counterpart
//! here: the core ships one concrete [`crate::force::Force`] implementation
//! rather than a runtime-selectable catalog (§11), so the force law is
//! fixed by `Driver`'s type parameter instead of a config field.

use crate::error::StepOutcome;
use crate::force::Force;
use crate::integration::BsIterator;
use crate::regularize::RegularizationKind;
use crate::system::ParticleSystem;

/// Run configuration, in the teacher's `PoolConfig` style: a plain struct
/// with `Default` plus consuming `with_*` builders that assert physically
/// sensible values.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Simulation time to stop at (same units as the particle store's clock).
    pub end_time: f64,
    /// Step size offered to the first `iterate` call.
    pub initial_step: f64,
    /// Interval, in simulation time, between sink callback invocations.
    pub output_cadence: f64,
    /// Absolute tolerance term in the BS error norm.
    pub atol: f64,
    /// Relative tolerance term in the BS error norm.
    pub rtol: f64,
    /// Which time transform the system was (or should be) built with; kept
    /// here for a driver that also owns construction, and for diagnostics.
    pub regularization_kind: RegularizationKind,
    /// Whether to `eprintln!` on rejection and fault events (§10.2).
    pub verbose: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            end_time: 1.0,
            initial_step: 1e-3,
            output_cadence: 1e-1,
            atol: 0.0,
            rtol: 1e-12,
            regularization_kind: RegularizationKind::LogH,
            verbose: false,
        }
    }
}

impl DriverConfig {
    pub fn new(end_time: f64, initial_step: f64) -> Self {
        assert!(end_time.is_finite() && end_time > 0.0, "end_time must be positive and finite");
        assert!(initial_step.is_finite() && initial_step > 0.0, "initial_step must be positive and finite");
        DriverConfig {
            end_time,
            initial_step,
            ..Default::default()
        }
    }

    pub fn with_output_cadence(mut self, cadence: f64) -> Self {
        assert!(cadence.is_finite() && cadence > 0.0, "output_cadence must be positive and finite");
        self.output_cadence = cadence;
        self
    }

    pub fn with_tolerances(mut self, atol: f64, rtol: f64) -> Self {
        assert!(atol.is_finite() && atol >= 0.0, "atol must be non-negative and finite");
        assert!(rtol.is_finite() && rtol > 0.0, "rtol must be positive and finite");
        self.atol = atol;
        self.rtol = rtol;
        self
    }

    pub fn with_regularization_kind(mut self, kind: RegularizationKind) -> Self {
        self.regularization_kind = kind;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of [`run`]: either the run reached `end_time`, or it aborted on
/// a fatal cause reported by the iterator (§7 "the driver surfaces fatal
/// codes to the caller verbatim").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveResult {
    Completed { steps_accepted: usize, steps_rejected: usize },
    Aborted { cause: crate::error::FatalCause, steps_accepted: usize, steps_rejected: usize },
}

/// Drive `system` from its current time to `config.end_time`, calling
/// `sink(time, energy_error)` at every `output_cadence`-spaced logging point
/// (§6's `(time, state, energy_error)` callback, minus `state` — callers who
/// want the trajectory can clone `system` themselves around `run`, since the
/// sink only gets a shared reference here and cloning every logging point
/// unconditionally would cost every caller who doesn't need it).
pub fn run<F: Force + Clone>(
    system: &mut ParticleSystem<F>,
    config: &DriverConfig,
    mut sink: impl FnMut(f64, &ParticleSystem<F>, f64),
) -> DriveResult {
    let mut iterator = BsIterator::new(config.atol, config.rtol);
    let mut h = config.initial_step;
    let mut steps_accepted = 0usize;
    let mut steps_rejected = 0usize;
    let initial_energy = system.total_energy();
    let mut next_output = system.store().time() + config.output_cadence;

    loop {
        if system.store().time() >= config.end_time {
            return DriveResult::Completed { steps_accepted, steps_rejected };
        }
        let step = h.min(config.end_time - system.store().time());

        match iterator.iterate(system, step) {
            StepOutcome::Accepted { h_next } => {
                steps_accepted += 1;
                h = h_next;
                while system.store().time() >= next_output {
                    let err = (system.total_energy() - initial_energy) / initial_energy.abs().max(f64::EPSILON);
                    sink(system.store().time(), system, err);
                    next_output += config.output_cadence;
                }
            }
            StepOutcome::Rejected { h_retry } => {
                steps_rejected += 1;
                if config.verbose {
                    eprintln!("nbody-core: step rejected at t={}, retrying with h={h_retry}", system.store().time());
                }
                h = h_retry;
            }
            StepOutcome::Fatal(cause) => {
                if config.verbose {
                    eprintln!("nbody-core: fatal fault at t={}: {cause}", system.store().time());
                }
                return DriveResult::Aborted { cause, steps_accepted, steps_rejected };
            }
        }
    }
}
