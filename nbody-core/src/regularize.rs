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
//! Time-transformed regularization (§4.5): log-H, TTL, and the no-op
//! passthrough. Holds the auxiliary scalars B (binding energy) and Ω and
//! maps an integrator step `h` to the physical `Δt` used by drift and kick.

use crate::scalar::Csum;
use crate::vector::Vector3;

/// Which time transformation maps integrator step to physical time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegularizationKind {
    /// Mikkola-Tanikawa log-H: `dt/ds = 1/(-PE)`.
    LogH,
    /// Mikkola TTL: `dt/ds = 1/Ω`.
    Ttl,
    /// No time transform: `Δt = h`.
    None,
}

/// Owns B and Ω and the arithmetic that relates them to drift/kick step
/// sizes. Both scalars are Kahan-compensated (§3): over the tens of
/// millions of kicks a long integration performs, plain summation would
/// drift B and Ω away from the state they are meant to track.
#[derive(Debug, Clone, PartialEq)]
pub struct Regularizer {
    kind: RegularizationKind,
    b: Csum<f64>,
    omega: Csum<f64>,
}

impl Regularizer {
    /// Initializes B = -(KE+PE), Ω = -PE, evaluated at t0 on the
    /// CoM-centered state (§3).
    pub fn new(kind: RegularizationKind, ke0: f64, pe0: f64) -> Self {
        Regularizer {
            kind,
            b: Csum::new(-(ke0 + pe0)),
            omega: Csum::new(-pe0),
        }
    }

    pub fn kind(&self) -> RegularizationKind {
        self.kind
    }

    pub fn b(&self) -> f64 {
        self.b.value
    }

    pub fn omega(&self) -> f64 {
        self.omega.value
    }

    pub fn b_compensated(&self) -> Csum<f64> {
        self.b
    }

    pub fn omega_compensated(&self) -> Csum<f64> {
        self.omega
    }

    /// Overwrite B and Ω directly, used when restoring a tableau snapshot.
    pub fn set_state(&mut self, b: Csum<f64>, omega: Csum<f64>) {
        self.b = b;
        self.omega = omega;
    }

    /// Kahan-accumulate a raw delta onto B, used when the BS iterator
    /// commits an extrapolated tableau delta onto a snapshot (as opposed to
    /// [`Regularizer::advance_binding_energy`], which derives the delta
    /// from the physics).
    pub fn accumulate_b(&mut self, delta: f64) {
        self.b += delta;
    }

    /// Kahan-accumulate a raw delta onto Ω; see [`Regularizer::accumulate_b`].
    pub fn accumulate_omega(&mut self, delta: f64) {
        self.omega += delta;
    }

    fn drift_denominator(&self, ke: f64) -> f64 {
        match self.kind {
            RegularizationKind::LogH => self.b.value + ke,
            RegularizationKind::Ttl => self.omega.value,
            RegularizationKind::None => 1.0,
        }
    }

    fn kick_denominator(&self, pe: f64, omega_hat: f64) -> f64 {
        match self.kind {
            RegularizationKind::LogH => -pe,
            RegularizationKind::Ttl => omega_hat,
            RegularizationKind::None => 1.0,
        }
    }

    /// Physical Δt for a drift of integrator step `h`, given the current
    /// kinetic energy.
    pub fn drift_dt(&self, h: f64, ke: f64) -> f64 {
        h / self.drift_denominator(ke)
    }

    /// Physical Δt for a kick of integrator step `h`, given the current
    /// potential energy and its TTL-recomputed counterpart Ω̂ (ignored
    /// outside TTL).
    pub fn kick_dt(&self, h: f64, pe: f64, omega_hat: f64) -> f64 {
        h / self.kick_denominator(pe, omega_hat)
    }

    /// True when the drift or kick denominator has collapsed to zero or
    /// gone non-finite (§4.1 failure mode, §7 "Denominator collapse").
    pub fn denominator_collapsed(&self, ke: f64, pe: f64, omega_hat: f64) -> bool {
        let d_drift = self.drift_denominator(ke);
        let d_kick = self.kick_denominator(pe, omega_hat);
        d_drift == 0.0 || !d_drift.is_finite() || d_kick == 0.0 || !d_kick.is_finite()
    }

    /// TTL's Ω update: advance by `Σ mᵢ (vᵢ · g_indep,i) · Δt` (§4.5). The
    /// velocity passed in is the real velocity for a velocity-independent
    /// force and the auxiliary velocity `u` when called from within the
    /// General-Midpoint sub-kick (§4.2 step 4) — the caller decides which,
    /// this just accumulates. A no-op outside TTL.
    pub fn advance_omega(&mut self, masses: &[f64], vel: &[Vector3], g_indep: &[Vector3], dt: f64) {
        if self.kind != RegularizationKind::Ttl {
            return;
        }
        let mut term = 0.0_f64;
        for i in 0..masses.len() {
            term += masses[i] * vel[i].dot(g_indep[i]);
        }
        self.omega += term * dt;
    }

    /// Log-H's B update: decrease by `Σ mᵢ (vᵢ · f_dep,i) · Δt` (§4.5),
    /// unchanged by velocity-independent forces. Called with the auxiliary
    /// velocity `u` from within the General-Midpoint sub-kick (§4.2 step
    /// 4). A no-op outside log-H.
    pub fn advance_binding_energy(&mut self, masses: &[f64], vel: &[Vector3], f_dep: &[Vector3], dt: f64) {
        if self.kind != RegularizationKind::LogH {
            return;
        }
        let mut term = 0.0_f64;
        for i in 0..masses.len() {
            term += masses[i] * vel[i].dot(f_dep[i]);
        }
        self.b -= term * dt;
    }
}
