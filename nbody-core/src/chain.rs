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
//! Chain coordinate transformation.
//!
//! Expresses positions as successive nearest-neighbor differences instead
//! of absolute Cartesian coordinates. When a subset of bodies is much
//! closer to each other than to the rest of the system, this keeps the
//! magnitude of every stored quantity comparable, which is what actually
//! buys back the precision a tight binary would otherwise lose to
//! Cartesian cancellation.

use crate::vector::Vector3;

fn invert(idx: &[usize]) -> Vec<usize> {
    let mut inv = vec![0usize; idx.len()];
    for (pos, &node) in idx.iter().enumerate() {
        inv[node] = pos;
    }
    inv
}

/// Stateless chain operations. The coordinator does not own the chain
/// arrays itself (those live on [`crate::system::ParticleSystem`]); it only
/// implements the maintenance operations on them.
pub struct ChainCoordinator;

impl ChainCoordinator {
    /// Greedy nearest-neighbor chain construction (§4.3 `build`).
    ///
    /// Starts with the globally closest pair, then repeatedly extends
    /// whichever terminus admits the shortest unused edge. Ties are broken
    /// by lexicographically smaller `(i, j)`, which keeps the result a
    /// deterministic function of the input positions.
    pub fn build(pos: &[Vector3]) -> Vec<usize> {
        let n = pos.len();
        assert!(n >= 2, "chain needs at least two nodes");

        let mut edges = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push(((pos[j] - pos[i]).norm(), i, j));
            }
        }
        edges.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap()
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let (_, i0, j0) = edges[0];
        let mut path = std::collections::VecDeque::with_capacity(n);
        path.push_back(i0);
        path.push_back(j0);
        let mut used = vec![false; n];
        used[i0] = true;
        used[j0] = true;

        while path.len() < n {
            let front = *path.front().unwrap();
            let back = *path.back().unwrap();
            let mut extension = None;
            for &(_, i, j) in &edges {
                if i == front && !used[j] {
                    extension = Some((true, j));
                    break;
                }
                if j == front && !used[i] {
                    extension = Some((true, i));
                    break;
                }
                if i == back && !used[j] {
                    extension = Some((false, j));
                    break;
                }
                if j == back && !used[i] {
                    extension = Some((false, i));
                    break;
                }
            }
            let (at_front, node) =
                extension.expect("chain construction stalled before visiting all nodes");
            used[node] = true;
            if at_front {
                path.push_front(node);
            } else {
                path.push_back(node);
            }
        }
        path.into_iter().collect()
    }

    /// §4.3 `topology_changed`: the chain is undirected, so a permutation
    /// and its exact reverse are the same chain.
    pub fn topology_changed(old: &[usize], new: &[usize]) -> bool {
        if old.len() != new.len() {
            return true;
        }
        if old == new {
            return false;
        }
        old.iter().rev().ne(new.iter())
    }

    /// Forward transform: Cartesian positions to chain pairs (§4.3
    /// `to_chain`). The last slot holds the absolute position of the chain
    /// head so the map is invertible without a separate origin.
    pub fn to_chain(pos: &[Vector3], idx: &[usize]) -> Vec<Vector3> {
        let n = idx.len();
        let mut cp = vec![Vector3::ZERO; n];
        for i in 0..n - 1 {
            cp[i] = pos[idx[i + 1]] - pos[idx[i]];
        }
        cp[n - 1] = pos[idx[0]];
        cp
    }

    /// Backward transform: chain pairs to Cartesian positions (§4.3
    /// `to_cartesian`).
    pub fn to_cartesian(cp: &[Vector3], idx: &[usize]) -> Vec<Vector3> {
        let n = idx.len();
        let mut pos = vec![Vector3::ZERO; n];
        pos[idx[0]] = cp[n - 1];
        for i in 0..n - 1 {
            pos[idx[i + 1]] = pos[idx[i]] + cp[i];
        }
        pos
    }

    /// Rebuild `cp` under a new index permutation without revisiting
    /// Cartesian space, by summing signed sub-sequences of the old chain
    /// (§4.3 `update_chain_pos`). The sign of a sub-sequence is +1 if the
    /// old chain traverses it in the same direction as the new edge, −1
    /// otherwise.
    pub fn update_chain_pos(cp_old: &[Vector3], idx_old: &[usize], idx_new: &[usize]) -> Vec<Vector3> {
        let n = idx_old.len();
        let inv_old = invert(idx_old);

        // prefix[k] = sum of cp_old[0..k); prefix[0] = 0.
        let mut prefix = vec![Vector3::ZERO; n];
        for k in 1..n {
            prefix[k] = prefix[k - 1] + cp_old[k - 1];
        }
        // Absolute position of `node`, expressed via the old chain's origin.
        let abs_pos = |node: usize| -> Vector3 { cp_old[n - 1] + prefix[inv_old[node]] };

        let mut cp_new = vec![Vector3::ZERO; n];
        for i in 0..n - 1 {
            let (a, b) = (idx_new[i], idx_new[i + 1]);
            let (oa, ob) = (inv_old[a], inv_old[b]);
            let (lo, hi, sign) = if oa < ob { (oa, ob, 1.0) } else { (ob, oa, -1.0) };
            cp_new[i] = (prefix[hi] - prefix[lo]).scale(sign);
        }
        cp_new[n - 1] = abs_pos(idx_new[0]);
        cp_new
    }
}
