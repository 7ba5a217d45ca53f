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
//! Error types for construction-time validation and macro-step faults.
//!
//! Two distinct failure surfaces exist here, matching different callers:
//! bad constructor input is rejected with [`NbodyError`] before any
//! integration happens, while faults discovered mid-integration (tableau
//! saturation, a collapsed denominator, non-finite arithmetic) are reported
//! through the step-size return value of `BsIterator::iterate` as a
//! [`StepOutcome`], never by unwinding.

use std::fmt;

/// Errors rejected at construction time (§7 "Bad input").
#[derive(Debug, Clone, PartialEq)]
pub enum NbodyError {
    /// Fewer than two bodies were supplied; a chain needs at least two nodes.
    TooFewBodies { count: usize },
    /// A mass was non-positive or non-finite.
    InvalidMass { id: u64, mass: f64 },
    /// The same particle id appeared more than once.
    DuplicateId { id: u64 },
}

impl fmt::Display for NbodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbodyError::TooFewBodies { count } => {
                write!(f, "need at least 2 bodies, got {count}")
            }
            NbodyError::InvalidMass { id, mass } => {
                write!(f, "particle {id} has invalid mass {mass}")
            }
            NbodyError::DuplicateId { id } => {
                write!(f, "duplicate particle id {id}")
            }
        }
    }
}

impl std::error::Error for NbodyError {}

/// Result of a single `BsIterator::iterate` call, mirroring the §6 exit
/// contract: the driver never catches a panic or an exception here, it
/// matches on this enum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The macro step was accepted; state has been advanced and `h_next` is
    /// the step size to try next.
    Accepted { h_next: f64 },
    /// The macro step was rejected on local error; retry from the same
    /// state with `h_retry`, which is strictly smaller than the step that
    /// was attempted.
    Rejected { h_retry: f64 },
    /// A non-recoverable fault: tableau saturation, a collapsed
    /// regularization denominator, or non-finite arithmetic. The driver
    /// must abort.
    Fatal(FatalCause),
}

/// Cause of a [`StepOutcome::Fatal`] result (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalCause {
    /// No row in the tableau converged within capacity K.
    DepthExhaustion,
    /// A regularization denominator (PE or Ω) collapsed to zero.
    DenominatorCollapse,
    /// NaN or infinity appeared in the tableau.
    NonFinite,
}

impl fmt::Display for FatalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalCause::DepthExhaustion => write!(f, "no tableau row converged within capacity"),
            FatalCause::DenominatorCollapse => {
                write!(f, "regularization denominator collapsed to zero")
            }
            FatalCause::NonFinite => write!(f, "non-finite value in extrapolation tableau"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = NbodyError::TooFewBodies { count: 1 };
        assert_eq!(err.to_string(), "need at least 2 bodies, got 1");
    }

    #[test]
    fn step_outcome_variants_are_distinguishable() {
        let accepted = StepOutcome::Accepted { h_next: 0.1 };
        let rejected = StepOutcome::Rejected { h_retry: 0.05 };
        assert_ne!(accepted, rejected);
        assert_eq!(
            StepOutcome::Fatal(FatalCause::NonFinite),
            StepOutcome::Fatal(FatalCause::NonFinite)
        );
    }
}
