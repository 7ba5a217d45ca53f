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
//! Structure-of-arrays particle storage.
//!
//! Mirrors the teacher's `SoAStorage<T>` layout discipline (dense, parallel
//! arrays indexed by a contiguous slot rather than a sparse map) but fixed
//! at construction: bodies are neither created nor destroyed during a run
//! (see spec Non-goals), so there is no entity/slot indirection to manage,
//! only the arrays themselves plus the compensated simulation clock.

use crate::error::NbodyError;
use crate::scalar::Csum;
use crate::vector::Vector3;

/// A body's mass must exceed this to be treated as non-immovable; below it
/// `1/m` is not meaningful to the regularizer. Set far below any physically
/// sensible body mass in solar units so it only catches genuine zero-mass
/// input.
pub const MIN_MASS: f64 = 1e-300;

/// Owns mass/position/velocity/id arrays plus the compensated simulation
/// time. Mutated only through `advance_*`, `recenter`, and `restore`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleStore {
    mass: Vec<f64>,
    pos: Vec<Vector3>,
    vel: Vec<Vector3>,
    id: Vec<u64>,
    time: Csum<f64>,
}

impl ParticleStore {
    /// Build a store from parallel per-body arrays. Rejects the inputs
    /// named in §7 "Bad input": fewer than two bodies, a non-positive or
    /// non-finite mass, or a duplicate id.
    pub fn new(
        ids: Vec<u64>,
        masses: Vec<f64>,
        pos: Vec<Vector3>,
        vel: Vec<Vector3>,
        t0: f64,
    ) -> Result<Self, NbodyError> {
        let n = ids.len();
        if n < 2 {
            return Err(NbodyError::TooFewBodies { count: n });
        }
        assert_eq!(masses.len(), n, "masses length must match ids length");
        assert_eq!(pos.len(), n, "pos length must match ids length");
        assert_eq!(vel.len(), n, "vel length must match ids length");

        for (&id, &m) in ids.iter().zip(masses.iter()) {
            if !(m.is_finite() && m > MIN_MASS) {
                return Err(NbodyError::InvalidMass { id, mass: m });
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if ids[i] == ids[j] {
                    return Err(NbodyError::DuplicateId { id: ids[i] });
                }
            }
        }

        Ok(ParticleStore {
            mass: masses,
            pos,
            vel,
            id: ids,
            time: Csum::new(t0),
        })
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn mass(&self, i: usize) -> f64 {
        self.mass[i]
    }

    pub fn masses(&self) -> &[f64] {
        &self.mass
    }

    pub fn pos(&self, i: usize) -> Vector3 {
        self.pos[i]
    }

    pub fn positions(&self) -> &[Vector3] {
        &self.pos
    }

    pub fn vel(&self, i: usize) -> Vector3 {
        self.vel[i]
    }

    pub fn velocities(&self) -> &[Vector3] {
        &self.vel
    }

    /// Direct mutable access to the velocity array, used by the
    /// General-Midpoint sub-kick to swap the real and auxiliary velocities
    /// in place (§4.2 step 2).
    pub fn velocities_mut(&mut self) -> &mut Vec<Vector3> {
        &mut self.vel
    }

    pub fn id(&self, i: usize) -> u64 {
        self.id[i]
    }

    pub fn time(&self) -> f64 {
        self.time.value
    }

    pub fn time_compensated(&self) -> Csum<f64> {
        self.time
    }

    /// Advance body `i`'s position by `delta` (already scaled by the
    /// regularized Δt by the caller).
    pub fn advance_pos(&mut self, i: usize, delta: Vector3) {
        self.pos[i] += delta;
    }

    /// Advance body `i`'s velocity by `delta`.
    pub fn advance_vel(&mut self, i: usize, delta: Vector3) {
        self.vel[i] += delta;
    }

    /// Advance the compensated simulation clock by `dt`.
    pub fn advance_time(&mut self, dt: f64) {
        self.time += dt;
    }

    pub fn total_mass(&self) -> f64 {
        self.mass.iter().sum()
    }

    /// Kinetic energy `Σ 0.5 m v²`.
    pub fn kinetic_energy(&self) -> f64 {
        self.pos
            .iter()
            .enumerate()
            .map(|(i, _)| 0.5 * self.mass[i] * self.vel[i].norm_sq())
            .sum()
    }

    fn com_pos(&self) -> Vector3 {
        let total = self.total_mass();
        let sum = self
            .mass
            .iter()
            .zip(self.pos.iter())
            .fold(Vector3::ZERO, |acc, (&m, &p)| acc + p.scale(m));
        sum.scale(1.0 / total)
    }

    fn com_vel(&self) -> Vector3 {
        let total = self.total_mass();
        let sum = self
            .mass
            .iter()
            .zip(self.vel.iter())
            .fold(Vector3::ZERO, |acc, (&m, &v)| acc + v.scale(m));
        sum.scale(1.0 / total)
    }

    /// Re-project the center of mass to the origin in both position and
    /// velocity (§4.1 `drift`/`post_iterate` postcondition).
    pub fn recenter(&mut self) {
        let com_p = self.com_pos();
        let com_v = self.com_vel();
        for p in self.pos.iter_mut() {
            *p = *p - com_p;
        }
        for v in self.vel.iter_mut() {
            *v = *v - com_v;
        }
    }

    /// Property 1/2: max deviation of Σmᵢposᵢ / Σmᵢvelᵢ from zero, scaled
    /// by the largest term, used by tests and by the driver's diagnostics.
    pub fn com_position_residual(&self) -> f64 {
        let com = self.com_pos().scale(self.total_mass());
        let max_term = self
            .mass
            .iter()
            .zip(self.pos.iter())
            .map(|(&m, &p)| p.scale(m).norm())
            .fold(0.0_f64, f64::max);
        com.norm() / max_term.max(f64::EPSILON)
    }

    pub fn com_velocity_residual(&self) -> f64 {
        let com = self.com_vel().scale(self.total_mass());
        let max_term = self
            .mass
            .iter()
            .zip(self.vel.iter())
            .map(|(&m, &v)| v.scale(m).norm())
            .fold(0.0_f64, f64::max);
        com.norm() / max_term.max(f64::EPSILON)
    }
}
