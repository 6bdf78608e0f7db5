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

//! Mean absolute error of a stencil output against `cos((i + 1) h)`.

use std::ops::Range;

use crate::error::{Result, StencilError};
use crate::grid::Grid;

/// Denominator of the mean.
///
/// The benchmarks have always divided by `N - 1` for both stencils, even
/// though the five-point stencil only produces `N - 4` values. That stays the
/// default so numbers remain comparable with earlier runs; `ValidCount`
/// gives the true mean over the validated indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorDivisor {
    #[default]
    SampleCountMinusOne,
    ValidCount,
}

impl ErrorDivisor {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("n-1") || s.eq_ignore_ascii_case("legacy") {
            Some(ErrorDivisor::SampleCountMinusOne)
        } else if s.eq_ignore_ascii_case("valid") || s.eq_ignore_ascii_case("valid-count") {
            Some(ErrorDivisor::ValidCount)
        } else {
            None
        }
    }

    pub fn denominator(self, num_elements: usize, range: &Range<usize>) -> usize {
        match self {
            ErrorDivisor::SampleCountMinusOne => num_elements.saturating_sub(1),
            ErrorDivisor::ValidCount => range.len(),
        }
    }
}

/// Sum of `|output[i] - cos((i + 1) h)|` over `range`, divided per `divisor`.
///
/// Only indices inside `range` are read; callers pass the stencil's valid
/// range so unwritten edge slots never contribute.
pub fn mean_abs_error(
    output: &[f64],
    grid: &Grid,
    range: Range<usize>,
    divisor: ErrorDivisor,
) -> Result<f64> {
    let values = output.get(range.clone()).ok_or_else(|| {
        StencilError::InvalidInput(format!(
            "validation range {:?} exceeds output length {}",
            range,
            output.len()
        ))
    })?;
    let denominator = divisor.denominator(grid.num_elements, &range);
    if denominator == 0 {
        return Err(StencilError::InvalidInput(
            "mean absolute error over an empty range".to_string(),
        ));
    }

    let sum: f64 = values
        .iter()
        .zip(range)
        .map(|(v, i)| (v - grid.derivative(i)).abs())
        .sum();
    Ok(sum / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_derivative_has_zero_error() {
        let g = Grid::new(16);
        let out: Vec<f64> = (0..16).map(|i| g.derivative(i)).collect();
        let e = mean_abs_error(&out, &g, 0..15, ErrorDivisor::SampleCountMinusOne).unwrap();
        assert_eq!(e, 0.0);
    }

    #[test]
    fn divisors_differ_only_in_denominator() {
        let g = Grid::new(10);
        let mut out: Vec<f64> = (0..10).map(|i| g.derivative(i)).collect();
        for v in &mut out[2..8] {
            *v += 0.5;
        }
        let legacy = mean_abs_error(&out, &g, 2..8, ErrorDivisor::SampleCountMinusOne).unwrap();
        let valid = mean_abs_error(&out, &g, 2..8, ErrorDivisor::ValidCount).unwrap();
        assert!((legacy - 0.5 * 6.0 / 9.0).abs() < 1e-12);
        assert!((valid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unwritten_slots_outside_range_are_ignored() {
        let g = Grid::new(8);
        let mut out: Vec<f64> = (0..8).map(|i| g.derivative(i)).collect();
        out[0] = f64::NAN;
        out[7] = f64::NAN;
        let e = mean_abs_error(&out, &g, 1..7, ErrorDivisor::ValidCount).unwrap();
        assert_eq!(e, 0.0);
    }

    #[test]
    fn rejects_bad_ranges() {
        let g = Grid::new(4);
        let out = vec![0.0; 4];
        assert!(mean_abs_error(&out, &g, 0..5, ErrorDivisor::ValidCount).is_err());
        assert!(mean_abs_error(&out, &g, 2..2, ErrorDivisor::ValidCount).is_err());
    }

    #[test]
    fn parse_divisor() {
        assert_eq!(ErrorDivisor::parse("N-1"), Some(ErrorDivisor::SampleCountMinusOne));
        assert_eq!(ErrorDivisor::parse("legacy"), Some(ErrorDivisor::SampleCountMinusOne));
        assert_eq!(ErrorDivisor::parse("valid"), Some(ErrorDivisor::ValidCount));
        assert_eq!(ErrorDivisor::parse("median"), None);
    }
}
