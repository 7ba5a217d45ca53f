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
//! Compensated (Kahan) summation scalar.
//!
//! Integrating for thousands of orbital periods means accumulating
//! hundreds of millions of `+=` operations onto `time`, `B`, `Ω`, and every
//! position component. Plain `f64` addition loses roughly one bit of
//! precision per accumulation step; [`Csum`] carries a running compensation
//! term so the accumulated round-off is fed back into the next addition
//! instead of silently vanishing.

/// Minimal floating-point surface `Csum` needs. Implemented for `f32` and
/// `f64`; kept local rather than pulling in a numeric-traits crate since
/// the core only ever instantiates `Csum<f64>`.
pub trait FloatScalar:
    Copy
    + PartialOrd
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
    + std::fmt::Debug
{
    const ZERO: Self;
    fn is_finite(self) -> bool;
    fn abs(self) -> Self;
}

impl FloatScalar for f64 {
    const ZERO: Self = 0.0;
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
    fn abs(self) -> Self {
        f64::abs(self)
    }
}

impl FloatScalar for f32 {
    const ZERO: Self = 0.0;
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
    fn abs(self) -> Self {
        f32::abs(self)
    }
}

/// A Kahan-compensated running sum over `F`.
///
/// `value` holds the visible sum; `error` holds the compensation term that
/// would otherwise be lost to rounding. Only `+=`/`-=` accumulate through
/// `error` (matching `kahan<T>::operator+=`/`operator-=` in the literature
/// this is drawn from); every other operator treats `Csum` as a plain
/// scalar and resets `error` to zero, since there is no well-defined
/// compensation for e.g. a product of two compensated sums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Csum<F: FloatScalar> {
    pub value: F,
    pub error: F,
}

impl<F: FloatScalar> Csum<F> {
    /// A fresh compensated scalar with zero error.
    pub fn new(value: F) -> Self {
        Csum { value, error: F::ZERO }
    }

    pub fn zero() -> Self {
        Csum::new(F::ZERO)
    }

    /// Kahan-accumulate `delta` into this value.
    pub fn accumulate(&mut self, delta: F) {
        let y = delta - self.error;
        let t = self.value + y;
        self.error = (t - self.value) - y;
        self.value = t;
    }

    /// Kahan-accumulate `-delta` into this value.
    pub fn decumulate(&mut self, delta: F) {
        self.accumulate(-delta);
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite() && self.error.is_finite()
    }
}

impl<F: FloatScalar> Default for Csum<F> {
    fn default() -> Self {
        Csum::zero()
    }
}

impl<F: FloatScalar> std::ops::AddAssign<F> for Csum<F> {
    fn add_assign(&mut self, rhs: F) {
        self.accumulate(rhs);
    }
}

impl<F: FloatScalar> std::ops::SubAssign<F> for Csum<F> {
    fn sub_assign(&mut self, rhs: F) {
        self.decumulate(rhs);
    }
}

impl<F: FloatScalar> std::ops::Add for Csum<F> {
    type Output = Csum<F>;
    fn add(self, rhs: Csum<F>) -> Csum<F> {
        Csum::new(self.value + rhs.value)
    }
}

impl<F: FloatScalar> std::ops::Sub for Csum<F> {
    type Output = Csum<F>;
    fn sub(self, rhs: Csum<F>) -> Csum<F> {
        Csum::new(self.value - rhs.value)
    }
}
