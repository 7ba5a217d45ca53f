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
//! The modified midpoint base integrator (§4.4) and the flat "active
//! variable" representation the BS tableau extrapolates over.
//!
//! Active variables are position, velocity, time, B, and Ω (plus the
//! auxiliary velocity for velocity-dependent forces) — exactly the set
//! [`crate::system::ParticleSystem`] mutates per macro step. The tableau
//! never stores these structurally; it stores the flat difference between
//! the evolved state and the macro step's starting snapshot (§3), so
//! [`ActiveState`] is deliberately a plain `Vec<f64>` rather than a second
//! copy of the system's own types.

use crate::error::FatalCause;
use crate::force::Force;
use crate::system::ParticleSystem;
use crate::vector::Vector3;

/// Flat snapshot of the active variables, or a delta between two such
/// snapshots. Layout: `N` position triples, `N` velocity triples, time, B,
/// Ω, then (only for velocity-dependent forces) `N` auxiliary-velocity
/// triples.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveState(pub Vec<f64>);

impl ActiveState {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn zeros(len: usize) -> Self {
        ActiveState(vec![0.0; len])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Elementwise `self - other`.
    pub fn minus(&self, other: &ActiveState) -> ActiveState {
        ActiveState(self.0.iter().zip(other.0.iter()).map(|(a, b)| a - b).collect())
    }

    /// Elementwise `self * scalar`.
    pub fn scale(&self, s: f64) -> ActiveState {
        ActiveState(self.0.iter().map(|a| a * s).collect())
    }

    /// Elementwise `self + other`.
    pub fn add(&self, other: &ActiveState) -> ActiveState {
        ActiveState(self.0.iter().zip(other.0.iter()).map(|(a, b)| a + b).collect())
    }
}

impl std::ops::Index<usize> for ActiveState {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

/// Number of `f64` values a system's active-variable vector needs.
pub fn active_len<F: Force + Clone>(sys: &ParticleSystem<F>) -> usize {
    let n = sys.store().len();
    let base = 6 * n + 3; // pos + vel + (time, B, Ω)
    if F::VELOCITY_DEPENDENT {
        base + 3 * n
    } else {
        base
    }
}

/// Flatten the current active variables into an [`ActiveState`].
pub fn extract_active<F: Force + Clone>(sys: &ParticleSystem<F>) -> ActiveState {
    let mut v = Vec::with_capacity(active_len(sys));
    for p in sys.store().positions() {
        v.push(p.x);
        v.push(p.y);
        v.push(p.z);
    }
    for vel in sys.store().velocities() {
        v.push(vel.x);
        v.push(vel.y);
        v.push(vel.z);
    }
    v.push(sys.store().time());
    v.push(sys.regularizer().b());
    v.push(sys.regularizer().omega());
    if F::VELOCITY_DEPENDENT {
        for u in sys.vel_aux() {
            v.push(u.x);
            v.push(u.y);
            v.push(u.z);
        }
    }
    ActiveState(v)
}

/// Nudge `sys` by `delta` using the same accumulate paths the physics
/// itself uses (`advance_pos`/`advance_vel`/`advance_time`, and B/Ω's
/// Kahan accumulators), so committing an extrapolated tableau delta onto a
/// snapshot preserves compensation exactly as a real sub-step would.
pub fn apply_delta<F: Force + Clone>(sys: &mut ParticleSystem<F>, delta: &ActiveState) {
    let n = sys.store().len();
    let mut idx = 0;
    for i in 0..n {
        let d = Vector3::new(delta[idx], delta[idx + 1], delta[idx + 2]);
        sys.store_mut().advance_pos(i, d);
        idx += 3;
    }
    for i in 0..n {
        let d = Vector3::new(delta[idx], delta[idx + 1], delta[idx + 2]);
        sys.store_mut().advance_vel(i, d);
        idx += 3;
    }
    sys.store_mut().advance_time(delta[idx]);
    idx += 1;
    sys.regularizer_mut().accumulate_b(delta[idx]);
    idx += 1;
    sys.regularizer_mut().accumulate_omega(delta[idx]);
    idx += 1;
    if F::VELOCITY_DEPENDENT {
        let aux = sys.vel_aux_mut();
        for i in 0..n {
            aux[i] += Vector3::new(delta[idx], delta[idx + 1], delta[idx + 2]);
            idx += 3;
        }
    }
}

/// §4.4 modified midpoint method: `n` sub-steps of KDK leapfrog across
/// macro interval `big_h`, `n` required even (`n = 2(r+1)` for tableau row
/// `r`).
pub fn integrate_midpoint<F: Force + Clone>(
    sys: &mut ParticleSystem<F>,
    big_h: f64,
    n: usize,
) -> Result<(), FatalCause> {
    debug_assert!(n >= 2 && n % 2 == 0, "midpoint sub-step count must be even and >= 2");
    let h = big_h / n as f64;

    sys.kick(h * 0.5)?;
    for _ in 0..(n - 1) {
        sys.drift(h)?;
        sys.kick(h)?;
    }
    sys.drift(h)?;
    sys.kick(h * 0.5)?;
    Ok(())
}
