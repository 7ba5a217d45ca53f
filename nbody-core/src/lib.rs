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
//! # nbody-core
//!
//! A high-accuracy gravitational N-body integrator combining Bulirsch-Stoer
//! extrapolation with a chain-regularized, time-transformed leapfrog
//! Hamiltonian system.
//!
//! ## Architecture
//!
//! - **[`ParticleSystem`]** composes a particle store, a time-transform
//!   [`regularize::Regularizer`] (log-H, TTL, or none), a [`force::Force`]
//!   law, and chain coordinates into the one object the integrator drives.
//! - **[`integration::midpoint`]** is the second-order modified-midpoint
//!   base method; **[`integration::BsIterator`]** runs it at several
//!   sub-step resolutions per macro step and extrapolates to the continuum
//!   limit, which is where the accuracy actually comes from.
//! - **[`driver::run`]** is the outer loop: it calls `iterate` until
//!   `end_time`, retrying on rejection and aborting on a fatal fault.
//!
//! ## Example
//!
//! ```rust
//! use nbody_core::{DriverConfig, ParticleStore, ParticleSystem, RegularizationKind, Vector3};
//! use nbody_core::force::NewtonianGravity;
//!
//! let store = ParticleStore::new(
//!     vec![0, 1],
//!     vec![1.0, 1e-3],
//!     vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)],
//!     vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)],
//!     0.0,
//! ).unwrap();
//! let mut system = ParticleSystem::new(store, RegularizationKind::LogH, NewtonianGravity::new(1.0, 0.0));
//! let config = DriverConfig::new(1.0, 1e-2);
//! nbody_core::driver::run(&mut system, &config, |_t, _sys, _err| {});
//! ```

#![warn(missing_docs)]

/// Construction-time and macro-step error types.
pub mod error;
/// Compensated (Kahan) scalar summation.
pub mod scalar;
/// Minimal 3-vector type.
pub mod vector;
/// Structure-of-arrays particle storage.
pub mod particles;
/// Chain coordinate transform.
pub mod chain;
/// Time-transformed regularization (log-H, TTL, none).
pub mod regularize;
/// The force contract and the reference Newtonian implementation.
pub mod force;
/// The particle system composition object.
pub mod system;
/// Modified-midpoint base integrator and the Bulirsch-Stoer iterator.
pub mod integration;
/// The driver loop.
pub mod driver;

pub use driver::{DriveResult, DriverConfig};
pub use error::{FatalCause, NbodyError, StepOutcome};
pub use integration::{ActiveState, BsIterator};
pub use particles::ParticleStore;
pub use regularize::RegularizationKind;
pub use scalar::Csum;
pub use system::ParticleSystem;
pub use vector::Vector3;
