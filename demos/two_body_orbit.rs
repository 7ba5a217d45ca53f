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
//! Integrates a Sun-mass/Earth-mass pair on a circular AU orbit for 50
//! years under log-H regularization and reports energy drift.

use nbody_core::force::NewtonianGravity;
use nbody_core::{DriverConfig, ParticleStore, ParticleSystem, RegularizationKind, Vector3};

const G_SOLAR_AU_YEAR: f64 = 4.0 * std::f64::consts::PI * std::f64::consts::PI;

fn main() {
    let m_sun = 1.0;
    let m_earth = 3.003e-6;
    let r = 1.0;
    let v = (G_SOLAR_AU_YEAR * (m_sun + m_earth) / r).sqrt();

    let store = ParticleStore::new(
        vec![0, 1],
        vec![m_sun, m_earth],
        vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(r, 0.0, 0.0)],
        vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, v, 0.0)],
        0.0,
    )
    .expect("valid two-body configuration");

    let mut system = ParticleSystem::new(
        store,
        RegularizationKind::LogH,
        NewtonianGravity::new(G_SOLAR_AU_YEAR, 0.0),
    );

    let config = DriverConfig::new(50.0, 1e-3)
        .with_output_cadence(10.0)
        .with_tolerances(0.0, 1e-13)
        .with_verbose(true);

    let outcome = nbody_core::driver::run(&mut system, &config, |t, sys, err| {
        println!("t={t:8.3}  E_rel_err={err:+.3e}  log_h_residual={:.3e}", sys.log_h_residual());
    });

    println!("{outcome:?}");
}
