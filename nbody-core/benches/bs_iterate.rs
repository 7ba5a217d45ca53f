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
//! Benchmarks for a single Bulirsch-Stoer macro step, which is the hot
//! loop of every driven run: tableau row construction, extrapolation, and
//! the order/step control decision.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbody_core::force::NewtonianGravity;
use nbody_core::{BsIterator, ParticleStore, ParticleSystem, RegularizationKind, Vector3};

fn circular_chain(n: usize) -> ParticleSystem<NewtonianGravity> {
    let mut ids = Vec::with_capacity(n);
    let mut masses = Vec::with_capacity(n);
    let mut pos = Vec::with_capacity(n);
    let mut vel = Vec::with_capacity(n);
    let central_mass = 1.0;
    ids.push(0);
    masses.push(central_mass);
    pos.push(Vector3::ZERO);
    vel.push(Vector3::ZERO);
    for i in 1..n {
        let r = i as f64;
        let v = (central_mass / r).sqrt();
        ids.push(i as u64);
        masses.push(1e-6);
        pos.push(Vector3::new(r, 0.0, 0.0));
        vel.push(Vector3::new(0.0, v, 0.0));
    }
    let store = ParticleStore::new(ids, masses, pos, vel, 0.0).unwrap();
    ParticleSystem::new(store, RegularizationKind::LogH, NewtonianGravity::new(1.0, 0.0))
}

fn bench_single_macro_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("bs_iterate_single_step");
    for &n in &[2usize, 8, 32] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("bodies", n), &n, |b, &n| {
            b.iter_batched(
                || (circular_chain(n), BsIterator::new(0.0, 1e-12)),
                |(mut sys, mut iter)| {
                    black_box(iter.iterate(&mut sys, 1e-3));
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_macro_step);
criterion_main!(benches);
