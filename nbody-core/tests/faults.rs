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
//! The §7 error-kind table, exercised end to end: bad input is rejected at
//! construction, a non-finite macro step is reported through
//! `StepOutcome::Fatal`, never by a panic or an unwind.

use nbody_core::force::NewtonianGravity;
use nbody_core::{BsIterator, FatalCause, NbodyError, ParticleStore, ParticleSystem, RegularizationKind, StepOutcome, Vector3};

#[test]
fn fewer_than_two_bodies_is_rejected_by_the_constructor() {
    let err = ParticleStore::new(vec![0], vec![1.0], vec![Vector3::ZERO], vec![Vector3::ZERO], 0.0);
    assert_eq!(err.unwrap_err(), NbodyError::TooFewBodies { count: 1 });
}

#[test]
fn non_positive_mass_is_rejected_by_the_constructor() {
    let err = ParticleStore::new(
        vec![0, 1],
        vec![1.0, -1.0],
        vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)],
        vec![Vector3::ZERO, Vector3::ZERO],
        0.0,
    );
    assert!(matches!(err, Err(NbodyError::InvalidMass { id: 1, .. })));
}

#[test]
fn duplicate_ids_are_rejected_by_the_constructor() {
    let err = ParticleStore::new(
        vec![5, 5],
        vec![1.0, 1.0],
        vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)],
        vec![Vector3::ZERO, Vector3::ZERO],
        0.0,
    );
    assert_eq!(err.unwrap_err(), NbodyError::DuplicateId { id: 5 });
}

#[test]
fn non_positive_macro_step_is_a_fatal_outcome_not_a_panic() {
    let store = ParticleStore::new(
        vec![0, 1],
        vec![1.0, 1e-3],
        vec![Vector3::ZERO, Vector3::new(1.0, 0.0, 0.0)],
        vec![Vector3::ZERO, Vector3::new(0.0, 1.0, 0.0)],
        0.0,
    )
    .unwrap();
    let mut sys = ParticleSystem::new(store, RegularizationKind::LogH, NewtonianGravity::new(1.0, 0.0));
    let mut iter: BsIterator<NewtonianGravity> = BsIterator::new(0.0, 1e-12);
    assert_eq!(iter.iterate(&mut sys, -1.0), StepOutcome::Fatal(FatalCause::NonFinite));
    assert_eq!(iter.iterate(&mut sys, f64::NAN), StepOutcome::Fatal(FatalCause::NonFinite));
}

/// Two bodies sitting exactly on top of each other: PE diverges to
/// -infinity before the softening-free force evaluator can even return a
/// finite acceleration, so both LogH's `B+KE` and TTL's `Ω` denominators
/// collapse the moment a kick is attempted.
#[test]
fn coincident_bodies_collapse_the_regularization_denominator() {
    let store = ParticleStore::new(
        vec![0, 1],
        vec![1.0, 1.0],
        vec![Vector3::ZERO, Vector3::ZERO],
        vec![Vector3::ZERO, Vector3::ZERO],
        0.0,
    )
    .unwrap();
    let sys = ParticleSystem::new(store, RegularizationKind::LogH, NewtonianGravity::new(1.0, 0.0));
    assert!(sys.denominator_collapsed());
}
