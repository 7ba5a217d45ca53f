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
//! Bulirsch-Stoer extrapolation iterator (§4.6-§4.7): drives the modified
//! midpoint base integrator at several sub-step resolutions per macro step,
//! extrapolates the results to the continuum limit with Aitken-Neville
//! recursion, and adapts both the step size and the extrapolation order
//! from the observed convergence rate.
//!
//! This is the newer of the two tableau variants the source carried side
//! by side (design notes): even sub-step counts starting at two, error
//! exponent `1/(2r+1)`, a delta-based tableau, and row 0 included in the
//! extrapolation.

use std::marker::PhantomData;

use crate::error::{FatalCause, StepOutcome};
use crate::force::Force;
use crate::integration::midpoint::{apply_delta, extract_active, integrate_midpoint, ActiveState};
use crate::system::ParticleSystem;

/// Tableau row capacity, K in §3.
pub const CAPACITY: usize = 8;

/// Adaptive-order, adaptive-step Bulirsch-Stoer driver over a
/// [`ParticleSystem`]. Owns only the bookkeeping that persists across
/// macro steps (`k*`, rejection/acceptance counters, and the per-row
/// constants derived once at construction); the tableau itself is
/// rebuilt fresh inside every `iterate` call since it holds deltas from
/// that call's own snapshot.
#[derive(Debug, Clone)]
pub struct BsIterator<F: Force + Clone> {
    k_star: usize,
    atol: f64,
    rtol: f64,
    accept_count: usize,
    reject_count: usize,
    /// n_r = 2(r+1), the sub-step count for row r.
    n_sub: [usize; CAPACITY],
    /// α_r = 1/(2r+1), the error exponent for row r.
    alpha: [f64; CAPACITY],
    /// s_r = 0.02^{α_r}, the step-size safety bound for row r.
    s: [f64; CAPACITY],
    /// c_r, cumulative sub-step cost through row r.
    c: [f64; CAPACITY],
    _force: PhantomData<F>,
}

impl<F: Force + Clone> BsIterator<F> {
    /// `atol`/`rtol` are the absolute/relative tolerances used in the
    /// error norm (§4.6c). `rtol` must be strictly positive so `err_r` is
    /// well-defined.
    pub fn new(atol: f64, rtol: f64) -> Self {
        assert!(atol.is_finite() && atol >= 0.0, "atol must be finite and non-negative");
        assert!(rtol.is_finite() && rtol > 0.0, "rtol must be finite and positive");

        let mut n_sub = [0usize; CAPACITY];
        let mut alpha = [0.0; CAPACITY];
        let mut s = [0.0; CAPACITY];
        let mut c = [0.0; CAPACITY];
        for r in 0..CAPACITY {
            n_sub[r] = 2 * (r + 1);
            alpha[r] = 1.0 / (2.0 * r as f64 + 1.0);
            s[r] = 0.02_f64.powf(alpha[r]);
        }
        c[0] = n_sub[0] as f64;
        for r in 1..CAPACITY {
            c[r] = c[r - 1] + n_sub[r] as f64;
        }

        BsIterator {
            k_star: 7usize.clamp(2, CAPACITY - 1),
            atol,
            rtol,
            accept_count: 0,
            reject_count: 0,
            n_sub,
            alpha,
            s,
            c,
            _force: PhantomData,
        }
    }

    pub fn k_star(&self) -> usize {
        self.k_star
    }

    /// Diagnostic-only estimate of the rejection rate (§4.6 state).
    pub fn rejection_rate(&self) -> f64 {
        let total = self.accept_count + self.reject_count;
        if total == 0 {
            0.0
        } else {
            self.reject_count as f64 / total as f64
        }
    }

    fn n_at(&self, r: usize) -> f64 {
        if r < CAPACITY {
            self.n_sub[r] as f64
        } else {
            2.0 * (r as f64 + 1.0)
        }
    }

    fn c_at(&self, r: usize) -> f64 {
        if r < CAPACITY {
            self.c[r]
        } else {
            let mut total = self.c[CAPACITY - 1];
            for i in CAPACITY..=r {
                total += self.n_at(i);
            }
            total
        }
    }

    fn divergence_threshold(&self, r: usize) -> f64 {
        let k = self.k_star;
        if r + 1 == k {
            self.n_at(r + 1) * self.n_at(r + 2) / self.n_at(0).powi(2)
        } else if r == k {
            self.n_at(r + 1) / self.n_at(0)
        } else {
            1.0
        }
    }

    /// §4.6 `iterate(system, H) -> H_next`. On fault or rejection the
    /// system passed in is left exactly as it was (the snapshot copy used
    /// for tableau rows never overwrites `sys` itself until a row is
    /// accepted).
    pub fn iterate(&mut self, sys: &mut ParticleSystem<F>, big_h: f64) -> StepOutcome {
        if !(big_h.is_finite() && big_h > 0.0) {
            return StepOutcome::Fatal(FatalCause::NonFinite);
        }

        let snapshot = sys.clone();
        let init = extract_active(&snapshot);

        // Row 0, outside the r=1.. loop per §4.6 step 2.
        let mut row0_trial = snapshot.clone();
        if let Err(cause) = integrate_midpoint(&mut row0_trial, big_h, self.n_sub[0]) {
            return StepOutcome::Fatal(cause);
        }
        let delta0 = extract_active(&row0_trial).minus(&init);
        if !delta0.is_finite() {
            return StepOutcome::Fatal(FatalCause::NonFinite);
        }

        let mut tableau: Vec<Vec<ActiveState>> = vec![vec![delta0]];
        let mut h = [0.0_f64; CAPACITY];
        let mut w = [0.0_f64; CAPACITY];

        for r in 1..CAPACITY {
            let mut trial = snapshot.clone();
            if let Err(cause) = integrate_midpoint(&mut trial, big_h, self.n_sub[r]) {
                return StepOutcome::Fatal(cause);
            }
            let raw_delta = extract_active(&trial).minus(&init);
            if !raw_delta.is_finite() {
                return StepOutcome::Fatal(FatalCause::NonFinite);
            }

            let mut row = Vec::with_capacity(r + 1);
            row.push(raw_delta);
            for j in 1..=r {
                let ratio = self.n_at(r) / self.n_at(r - j);
                let coef = 1.0 / (ratio * ratio - 1.0);
                let prev_same_row = row[j - 1].clone();
                let prev_row_above = &tableau[r - 1][j - 1];
                let diff = prev_same_row.minus(prev_row_above);
                row.push(prev_same_row.add(&diff.scale(coef)));
            }
            if !row[r].is_finite() {
                return StepOutcome::Fatal(FatalCause::NonFinite);
            }
            tableau.push(row);

            // §4.6c error norm.
            let mut err_r = 0.0_f64;
            for i in 0..init.len() {
                let t_r_r = tableau[r][r][i];
                let t_r_r1 = tableau[r][r - 1][i];
                let denom = self.atol
                    + self.rtol * (t_r_r1 + init[i]).abs().max((t_r_r + init[i]).abs());
                let e = (t_r_r - t_r_r1).abs() / denom.max(f64::EPSILON);
                if e > err_r {
                    err_r = e;
                }
            }
            err_r /= self.rtol;

            let f_r = if err_r == 0.0 {
                1.0 / self.s[r]
            } else {
                (0.9 * (0.95 / err_r).powf(self.alpha[r])).clamp(self.s[r] / 4.0, 1.0 / self.s[r])
            };
            h[r] = big_h * f_r;
            w[r] = self.c[r] / f_r;

            let (lo, mid, hi) = (self.k_star.saturating_sub(1), self.k_star, self.k_star + 1);
            if r == lo || r == mid || r == hi {
                if err_r < 1.0 {
                    return self.accept(sys, &snapshot, &tableau[r][r], r, &h, &w);
                }
                let d_r = self.divergence_threshold(r);
                if err_r > d_r * d_r {
                    self.reject_count += 1;
                    let h_retry = if r + 1 == self.k_star {
                        big_h * self.c_at(r + 1) / self.c_at(r)
                    } else {
                        h[self.k_star]
                    };
                    return self.reject_or_exhaust(h_retry, big_h);
                }
            }

            if r == CAPACITY - 1 {
                // §4.6 step 5: row capacity reached without a trigger.
                self.reject_count += 1;
                let h_retry = h[self.k_star] / 2.0;
                return self.reject_or_exhaust(h_retry, big_h);
            }
        }

        StepOutcome::Fatal(FatalCause::DepthExhaustion)
    }

    fn reject_or_exhaust(&self, h_retry: f64, big_h: f64) -> StepOutcome {
        if h_retry.is_finite() && h_retry > 0.0 && h_retry < big_h {
            StepOutcome::Rejected { h_retry }
        } else {
            StepOutcome::Fatal(FatalCause::DepthExhaustion)
        }
    }

    /// §4.7 order/step control, applied once a row inside the convergence
    /// window has converged.
    fn accept(
        &mut self,
        sys: &mut ParticleSystem<F>,
        snapshot: &ParticleSystem<F>,
        delta: &ActiveState,
        r: usize,
        h: &[f64; CAPACITY],
        w: &[f64; CAPACITY],
    ) -> StepOutcome {
        let mut new_sys = snapshot.clone();
        apply_delta(&mut new_sys, delta);
        new_sys.post_iterate();
        *sys = new_sys;
        self.accept_count += 1;

        let k = self.k_star;
        let clamp_k = |v: isize| -> usize { v.clamp(2, (CAPACITY - 1) as isize) as usize };

        let h_next = if r + 1 == k {
            // Delta = -1
            if w[r] < 0.9 * w[r - 1] || k <= 2 {
                h[r] * self.c_at(r + 1) / self.c_at(r)
            } else {
                self.k_star = clamp_k(k as isize - 1);
                h[self.k_star]
            }
        } else if r == k {
            // Delta = 0
            if w[r - 1] < 0.8 * w[r] {
                self.k_star = clamp_k(k as isize - 1);
                h[self.k_star]
            } else if w[r] < 0.9 * w[r - 1] {
                self.k_star = clamp_k(k as isize + 1);
                h[r] * self.c_at(r + 1) / self.c_at(r)
            } else {
                h[r]
            }
        } else if r == k + 1 {
            // Delta = +1
            let candidate_k = if w[r - 2] < 0.8 * w[r - 1] {
                clamp_k(k as isize - 1)
            } else {
                k
            };
            if w[r] < 0.9 * w[k] {
                self.k_star = clamp_k(k as isize + 1);
                h[self.k_star]
            } else {
                self.k_star = candidate_k;
                h[self.k_star]
            }
        } else {
            // Any other Delta is a programming fault (§4.7).
            return StepOutcome::Fatal(FatalCause::DepthExhaustion);
        };

        StepOutcome::Accepted { h_next }
    }
}
