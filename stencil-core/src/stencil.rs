//
// Licensed to the Apache Software Foundation (ASF) under one or more
// contributor license agreements.  See the NOTICE file distributed with
// this work for additional information regarding copyright ownership.
// The ASF licenses this file to You under the Apache License, Version 2.0
// (the "License"); you may not use this file except in compliance with
// the License.  You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Finite-difference first-derivative stencils.
//!
//! The formulas here are the single source of truth for both backends: the
//! host backend calls them directly and `stencil.cu` spells out the same
//! expressions in the same operation order.

use std::ops::Range;

/// Forward difference: `(w[1] - w[0]) / h`, window `[i, i+1]`.
#[inline]
pub fn two_point(window: &[f64; 2], h: f64) -> f64 {
    (window[1] - window[0]) / h
}

/// Fourth-order central difference over `[i-2, i+2]` with coefficients
/// `{1, -8, 0, 8, -1} / 12h`. Takes `h12 = 12 h`.
#[inline]
pub fn five_point(window: &[f64; 5], h12: f64) -> f64 {
    (-window[4] + 8.0 * (window[3] - window[1]) + window[0]) / h12
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilKind {
    TwoPoint,
    FivePoint,
}

impl StencilKind {
    pub fn name(self) -> &'static str {
        match self {
            StencilKind::TwoPoint => "2pt",
            StencilKind::FivePoint => "5pt",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StencilKind::TwoPoint => "two-point forward difference, O(h)",
            StencilKind::FivePoint => "five-point central difference, O(h^4)",
        }
    }

    /// Smallest N with at least one valid output index.
    pub fn min_elements(self) -> usize {
        match self {
            StencilKind::TwoPoint => 2,
            StencilKind::FivePoint => 5,
        }
    }

    /// Output indices whose window lies inside `[0, n)`.
    pub fn valid_range(self, n: usize) -> Range<usize> {
        match self {
            StencilKind::TwoPoint => 0..n.saturating_sub(1),
            StencilKind::FivePoint => 2..n.saturating_sub(2).max(2),
        }
    }

    /// Value handed to the kernel for grid spacing `h`. The five-point
    /// kernel expects `12 h` so its body keeps the textbook coefficients.
    pub fn launch_spacing(self, h: f64) -> f64 {
        match self {
            StencilKind::TwoPoint => h,
            StencilKind::FivePoint => 12.0 * h,
        }
    }

    /// Stencil output at `i`, or `None` where the window leaves the input.
    /// `spacing` is the launch spacing (see [`StencilKind::launch_spacing`]).
    #[inline]
    pub fn evaluate(self, input: &[f64], i: usize, spacing: f64) -> Option<f64> {
        if !self.valid_range(input.len()).contains(&i) {
            return None;
        }
        match self {
            StencilKind::TwoPoint => {
                let window: &[f64; 2] = input[i..i + 2].try_into().ok()?;
                Some(two_point(window, spacing))
            }
            StencilKind::FivePoint => {
                let window: &[f64; 5] = input[i - 2..i + 3].try_into().ok()?;
                Some(five_point(window, spacing))
            }
        }
    }

    /// Single-threaded reference: writes every valid index of `out`, leaves
    /// the rest untouched.
    pub fn apply(self, input: &[f64], spacing: f64, out: &mut [f64]) {
        for i in self.valid_range(input.len().min(out.len())) {
            if let Some(v) = self.evaluate(input, i, spacing) {
                out[i] = v;
            }
        }
    }
}
