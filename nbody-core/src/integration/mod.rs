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
//! Integration: a modified-midpoint base method (§4.4) driven by a
//! Bulirsch-Stoer extrapolation iterator (§4.6-§4.7).
//!
//! The base integrator alone is only second order and would need an
//! impractically small step to hold energy drift near machine precision
//! over thousands of orbits; the BS iterator runs it at several
//! resolutions per macro step and extrapolates to the continuum limit,
//! which is what actually buys the accuracy this crate exists for.

pub mod bs;
pub mod midpoint;

pub use bs::BsIterator;
pub use midpoint::ActiveState;
