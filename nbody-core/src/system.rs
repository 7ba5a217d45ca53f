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
//! The particle system: composes the particle store, the regularizer, the
//! force evaluator, and the chain coordinates into the single object the
//! integrators drive (§4.1). Composition, not inheritance, per the
//! re-architecture called for in the design notes — each collaborator is
//! an independent value owned by `ParticleSystem`.

use crate::chain::ChainCoordinator;
use crate::error::FatalCause;
use crate::force::Force;
use crate::particles::ParticleStore;
use crate::regularize::{RegularizationKind, Regularizer};
use crate::vector::Vector3;

/// Composition object described in §4.1. Generic over the force law so the
/// arithmetic hot path monomorphizes and inlines rather than going through
/// a vtable (per the design notes' preference for compile-time
/// specialization over the original's runtime policy objects).
#[derive(Debug, Clone)]
pub struct ParticleSystem<F: Force + Clone> {
    store: ParticleStore,
    regularizer: Regularizer,
    force: F,
    idx: Vec<usize>,
    cp: Vec<Vector3>,
    cv: Vec<Vector3>,
    /// Auxiliary velocity `u` (§4.2); resynchronized with `vel` once per
    /// macro step by `pre_iterate`.
    vel_aux: Vec<Vector3>,
    acc: Vec<Vector3>,
}

impl<F: Force + Clone> ParticleSystem<F> {
    /// Builds the system from an already-validated particle store, CoM
    /// centers it, and initializes B and Ω from the t0 energies (§3).
    pub fn new(mut store: ParticleStore, kind: RegularizationKind, force: F) -> Self {
        store.recenter();
        let n = store.len();

        let ke0 = store.kinetic_energy();
        let pe0 = force.potential_energy(store.masses(), store.positions());
        let regularizer = Regularizer::new(kind, ke0, pe0);

        let idx = ChainCoordinator::build(store.positions());
        let cp = ChainCoordinator::to_chain(store.positions(), &idx);
        let cv = ChainCoordinator::to_chain(store.velocities(), &idx);
        let vel_aux = store.velocities().to_vec();

        let mut system = ParticleSystem {
            store,
            regularizer,
            force,
            idx,
            cp,
            cv,
            vel_aux,
            acc: vec![Vector3::ZERO; n],
        };
        system.evaluate_acc();
        system
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn regularizer(&self) -> &Regularizer {
        &self.regularizer
    }

    pub fn regularizer_mut(&mut self) -> &mut Regularizer {
        &mut self.regularizer
    }

    pub fn vel_aux(&self) -> &[Vector3] {
        &self.vel_aux
    }

    pub fn vel_aux_mut(&mut self) -> &mut Vec<Vector3> {
        &mut self.vel_aux
    }

    pub fn chain_index(&self) -> &[usize] {
        &self.idx
    }

    pub fn chain_pos(&self) -> &[Vector3] {
        &self.cp
    }

    pub fn chain_vel(&self) -> &[Vector3] {
        &self.cv
    }

    pub fn acc(&self) -> &[Vector3] {
        &self.acc
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.store.kinetic_energy()
    }

    pub fn potential_energy(&self) -> f64 {
        self.force.potential_energy(self.store.masses(), self.store.positions())
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }

    /// Testable property 3: `|KE + PE + B| / |PE|`, which log-H with a
    /// Newtonian force should hold near zero at every logging point.
    pub fn log_h_residual(&self) -> f64 {
        let pe = self.potential_energy();
        (self.total_energy() + self.regularizer.b()).abs() / pe.abs().max(f64::EPSILON)
    }

    fn sync_chain_mirrors(&mut self) {
        self.cp = ChainCoordinator::to_chain(self.store.positions(), &self.idx);
        self.cv = ChainCoordinator::to_chain(self.store.velocities(), &self.idx);
    }

    /// §4.1 `evaluate_acc`: writes `acc` from the current state. No state
    /// change beyond the cached acceleration buffer.
    pub fn evaluate_acc(&mut self) {
        self.force
            .eval_independent(self.store.masses(), self.store.positions(), &mut self.acc);
        if F::VELOCITY_DEPENDENT {
            self.force.eval_dependent(
                self.store.masses(),
                self.store.positions(),
                self.store.velocities(),
                &mut self.acc,
            );
        }
    }

    /// §4.1 `pre_iterate`: synchronize the auxiliary velocity with the real
    /// velocity. Called once at the start of a macro step, before any of
    /// its sub-step attempts.
    pub fn pre_iterate(&mut self) {
        self.vel_aux = self.store.velocities().to_vec();
    }

    /// §4.1 `post_iterate`: rebuild the chain permutation if the
    /// nearest-neighbor topology changed, and re-project the center of
    /// mass. Called once after an accepted macro step.
    pub fn post_iterate(&mut self) {
        self.store.recenter();
        let new_idx = ChainCoordinator::build(self.store.positions());
        if ChainCoordinator::topology_changed(&self.idx, &new_idx) {
            self.cp = ChainCoordinator::update_chain_pos(&self.cp, &self.idx, &new_idx);
            self.idx = new_idx;
        }
        self.cv = ChainCoordinator::to_chain(self.store.velocities(), &self.idx);
    }

    /// §4.1 `drift(h)`: advances position by `vel · Δt` and time by `Δt`,
    /// where `Δt` is the regularized drift step (§4.5).
    pub fn drift(&mut self, h: f64) -> Result<(), FatalCause> {
        let ke = self.store.kinetic_energy();
        let dt = self.regularizer.drift_dt(h, ke);
        if !dt.is_finite() {
            return Err(FatalCause::DenominatorCollapse);
        }
        let n = self.store.len();
        for i in 0..n {
            let v = self.store.vel(i);
            self.store.advance_pos(i, v.scale(dt));
        }
        self.store.advance_time(dt);
        self.store.recenter();
        self.sync_chain_mirrors();
        Ok(())
    }

    /// §4.1 `kick(h)`: advances velocity by `acc · Δt`, dispatching to the
    /// General-Midpoint sub-kick (§4.2) for velocity-dependent forces.
    pub fn kick(&mut self, h: f64) -> Result<(), FatalCause> {
        if F::VELOCITY_DEPENDENT {
            self.kick_general_midpoint(h)
        } else {
            self.kick_plain(h)
        }
    }

    fn kick_plain(&mut self, h: f64) -> Result<(), FatalCause> {
        self.evaluate_acc();
        let pe = self.force.potential_energy(self.store.masses(), self.store.positions());
        let omega_hat = -pe;
        let dt = self.regularizer.kick_dt(h, pe, omega_hat);
        if !dt.is_finite() {
            return Err(FatalCause::DenominatorCollapse);
        }

        let n = self.store.len();
        let g_indep = self.acc.clone();
        let masses = self.store.masses().to_vec();

        self.regularizer
            .advance_omega(&masses, self.store.velocities(), &g_indep, dt * 0.5);
        for i in 0..n {
            let a = self.acc[i];
            self.store.advance_vel(i, a.scale(dt));
        }
        self.regularizer
            .advance_omega(&masses, self.store.velocities(), &g_indep, dt * 0.5);

        self.sync_chain_mirrors();
        if !self.store.velocities().iter().all(|v| v.is_finite()) {
            return Err(FatalCause::NonFinite);
        }
        Ok(())
    }

    /// §4.2 General-Midpoint sub-kick for velocity-dependent forces.
    fn kick_general_midpoint(&mut self, h: f64) -> Result<(), FatalCause> {
        let pe = self.force.potential_energy(self.store.masses(), self.store.positions());
        let omega_hat = -pe;
        let dt = self.regularizer.kick_dt(h, pe, omega_hat);
        if !dt.is_finite() {
            return Err(FatalCause::DenominatorCollapse);
        }

        let n = self.store.len();
        let masses = self.store.masses().to_vec();
        let pos = self.store.positions().to_vec();

        // 1. u <- u + a(x, v) * dt/2
        self.evaluate_acc();
        for i in 0..n {
            self.vel_aux[i] += self.acc[i].scale(dt * 0.5);
        }

        // 2. swap(u, v); a' = a(x, v) [evaluated with u in the v slot]; swap back
        std::mem::swap(self.store.velocities_mut(), &mut self.vel_aux);
        let mut g_indep = vec![Vector3::ZERO; n];
        let mut f_dep = vec![Vector3::ZERO; n];
        self.force.eval_independent(&masses, &pos, &mut g_indep);
        self.force.eval_dependent(&masses, &pos, self.store.velocities(), &mut f_dep);
        let a_prime: Vec<Vector3> = g_indep.iter().zip(f_dep.iter()).map(|(&g, &f)| g + f).collect();
        std::mem::swap(self.store.velocities_mut(), &mut self.vel_aux);

        // 3. v <- v + a' * dt
        for i in 0..n {
            self.store.advance_vel(i, a_prime[i].scale(dt));
        }

        // 4. update B, Ω using u (not v), over the full Δt
        self.regularizer.advance_omega(&masses, &self.vel_aux, &g_indep, dt);
        self.regularizer.advance_binding_energy(&masses, &self.vel_aux, &f_dep, dt);

        // 5. u <- u + a(x, v) * dt/2, with the new v
        self.evaluate_acc();
        for i in 0..n {
            self.vel_aux[i] += self.acc[i].scale(dt * 0.5);
        }

        self.sync_chain_mirrors();
        if !self.store.velocities().iter().all(|v| v.is_finite()) {
            return Err(FatalCause::NonFinite);
        }
        Ok(())
    }

    /// True when the next drift or kick would divide by a collapsed
    /// denominator (§4.1 failure mode).
    pub fn denominator_collapsed(&self) -> bool {
        let ke = self.store.kinetic_energy();
        let pe = self.force.potential_energy(self.store.masses(), self.store.positions());
        self.regularizer.denominator_collapsed(ke, pe, -pe)
    }
}
