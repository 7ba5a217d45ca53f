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
//! Hierarchical triple in the Kozai-Lidov regime: a = 0.5 AU circular
//! inner binary orbited by a third body at a = 5 AU, mutual inclination
//! 64.99 degrees. Prints the inner eccentricity over a few hundred years
//! so the secular oscillation is visible; the full 3e4-year regression
//! (testable property 10) lives in `tests/scenarios.rs`.

use nbody_core::force::NewtonianGravity;
use nbody_core::{DriverConfig, ParticleStore, ParticleSystem, RegularizationKind, Vector3};

const G: f64 = 4.0 * std::f64::consts::PI * std::f64::consts::PI;

fn main() {
    let m1 = 1.0;
    let m2 = 1.0;
    let m3 = 1.0;
    let a_in = 0.5;
    let a_out = 5.0;
    let incl = 64.99_f64.to_radians();

    let v_in = (G * (m1 + m2) / a_in).sqrt();
    let v_out = (G * (m1 + m2 + m3) / a_out).sqrt();

    // Inner binary in the xy-plane, outer body's plane tilted by `incl`
    // about the x-axis so the mutual inclination is exactly `incl`.
    let outer_pos = Vector3::new(a_out * incl.cos(), 0.0, a_out * incl.sin());
    let outer_vel = Vector3::new(0.0, v_out * incl.cos(), v_out * incl.sin());

    let store = ParticleStore::new(
        vec![0, 1, 2],
        vec![m1, m2, m3],
        vec![
            Vector3::new(-a_in * m2 / (m1 + m2), 0.0, 0.0),
            Vector3::new(a_in * m1 / (m1 + m2), 0.0, 0.0),
            outer_pos,
        ],
        vec![
            Vector3::new(0.0, -v_in * m2 / (m1 + m2), 0.0),
            Vector3::new(0.0, v_in * m1 / (m1 + m2), 0.0),
            outer_vel,
        ],
        0.0,
    )
    .expect("valid hierarchical triple configuration");

    let mut system = ParticleSystem::new(store, RegularizationKind::LogH, NewtonianGravity::new(G, 0.0));

    let config = DriverConfig::new(500.0, 1e-3).with_output_cadence(5.0).with_tolerances(0.0, 1e-12);

    nbody_core::driver::run(&mut system, &config, |t, sys, _err| {
        let rel = sys.store().pos(1) - sys.store().pos(0);
        let relv = sys.store().vel(1) - sys.store().vel(0);
        let mu = G * (m1 + m2);
        let r = rel.norm();
        let v2 = relv.norm_sq();
        let energy = 0.5 * v2 - mu / r;
        let h = rel.cross(relv);
        let e_sq = (1.0 + 2.0 * energy * h.norm_sq() / (mu * mu)).max(0.0);
        println!("t={t:8.2}  e_inner={:.5}", e_sq.sqrt());
    });
}
