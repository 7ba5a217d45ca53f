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
//! The force contract consumed by [`crate::system::ParticleSystem`], plus
//! the one reference implementation (softened Newtonian gravity) the core
//! ships for end-to-end testing. Any other force law is an external
//! collaborator; the system only ever talks to the [`Force`] trait.

use crate::vector::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pure evaluator of acceleration from the current state. Split into an
/// always-present velocity-independent part and a velocity-dependent part,
/// because the regularizer needs to treat them differently (§4.5: TTL's Ω
/// advances only from the velocity-independent acceleration, log-H's B
/// only from the velocity-dependent part).
pub trait Force: Send + Sync {
    /// Compile-time flag: does `eval_dependent` ever return a nonzero
    /// acceleration? When false, the system skips the General-Midpoint
    /// sub-kick entirely and uses the plain symmetric kick.
    const VELOCITY_DEPENDENT: bool;

    /// Velocity-independent acceleration contribution, e.g. Newtonian
    /// gravity. Always evaluated.
    fn eval_independent(&self, masses: &[f64], pos: &[Vector3], acc: &mut [Vector3]);

    /// Velocity-dependent acceleration contribution, e.g. a drag or
    /// post-Newtonian term. Must leave `acc` untouched (not zeroed) when
    /// `VELOCITY_DEPENDENT` is false; implementations that are purely
    /// velocity-independent can use the provided default, which adds
    /// nothing.
    fn eval_dependent(&self, _masses: &[f64], _pos: &[Vector3], _vel: &[Vector3], _acc: &mut [Vector3]) {}

    /// Total acceleration `g_indep + f_dep`, for callers that don't need
    /// the two parts separately.
    fn eval(&self, masses: &[f64], pos: &[Vector3], vel: &[Vector3], acc: &mut [Vector3]) {
        self.eval_independent(masses, pos, acc);
        if Self::VELOCITY_DEPENDENT {
            self.eval_dependent(masses, pos, vel, acc);
        }
    }

    /// Potential energy of the velocity-independent part, used by the
    /// regularizer for drift/kick timing (`B + KE`, `-PE`, `Ω`).
    fn potential_energy(&self, masses: &[f64], pos: &[Vector3]) -> f64;
}

/// Gravitational constant, CODATA 2018 value (m^3 kg^-1 s^-2); callers
/// working in solar/AU/year units should construct with a unit-consistent
/// `g_constant` instead of this default.
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67430e-11;

/// Plummer-softened Newtonian gravity, `a_i = G Σ_{j≠i} m_j (x_j - x_i) /
/// (|x_j - x_i|² + ε²)^{3/2}`. Velocity-independent: `VELOCITY_DEPENDENT =
/// false`.
#[derive(Debug, Clone, Copy)]
pub struct NewtonianGravity {
    g_constant: f64,
    softening: f64,
}

impl NewtonianGravity {
    /// `softening` must be finite and non-negative; zero disables softening
    /// (appropriate once the chain coordinate handles close encounters, but
    /// then a true collision still drives PE to infinity and the
    /// regularizer denominator fault in §4.1 is expected to fire).
    pub fn new(g_constant: f64, softening: f64) -> Self {
        assert!(g_constant.is_finite() && g_constant > 0.0, "g_constant must be positive and finite");
        assert!(softening.is_finite() && softening >= 0.0, "softening must be non-negative and finite");
        NewtonianGravity { g_constant, softening }
    }

    /// Construct with the standard gravitational constant in SI units.
    pub fn si(softening: f64) -> Self {
        Self::new(GRAVITATIONAL_CONSTANT, softening)
    }

    fn pair_accel(&self, m_other: f64, delta: Vector3) -> Vector3 {
        let r2 = delta.norm_sq() + self.softening * self.softening;
        let inv_r3 = r2.powf(-1.5);
        delta.scale(self.g_constant * m_other * inv_r3)
    }
}

impl Force for NewtonianGravity {
    const VELOCITY_DEPENDENT: bool = false;

    fn eval_independent(&self, masses: &[f64], pos: &[Vector3], acc: &mut [Vector3]) {
        let n = pos.len();
        for a in acc.iter_mut() {
            *a = Vector3::ZERO;
        }

        #[cfg(feature = "parallel")]
        {
            let contributions: Vec<Vector3> = (0..n)
                .into_par_iter()
                .map(|i| {
                    let mut a_i = Vector3::ZERO;
                    for j in 0..n {
                        if i == j {
                            continue;
                        }
                        a_i += self.pair_accel(masses[j], pos[j] - pos[i]);
                    }
                    a_i
                })
                .collect();
            acc.copy_from_slice(&contributions);
        }

        #[cfg(not(feature = "parallel"))]
        {
            for i in 0..n {
                for j in (i + 1)..n {
                    let delta = pos[j] - pos[i];
                    let a_on_i = self.pair_accel(masses[j], delta);
                    let a_on_j = self.pair_accel(masses[i], -delta);
                    acc[i] += a_on_i;
                    acc[j] += a_on_j;
                }
            }
        }
    }

    fn potential_energy(&self, masses: &[f64], pos: &[Vector3]) -> f64 {
        let n = pos.len();
        let mut pe = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let r2 = (pos[j] - pos[i]).norm_sq() + self.softening * self.softening;
                pe -= self.g_constant * masses[i] * masses[j] / r2.sqrt();
            }
        }
        pe
    }
}
