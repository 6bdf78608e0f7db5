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

//! Uniform grid over one period of a sine wave.

use rayon::prelude::*;
use std::f64::consts::PI;

use crate::error::Result;
use crate::gpu::host::host_buffer;

/// Sample count and spacing of the benchmark signal.
///
/// Sample `i` sits at `x = (i + 1) h` with `h = 2π / N`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub num_elements: usize,
    pub spacing: f64,
}

impl Grid {
    pub fn new(num_elements: usize) -> Self {
        let length = 2.0 * PI;
        Self {
            num_elements,
            spacing: length / num_elements as f64,
        }
    }

    #[inline]
    pub fn position(&self, i: usize) -> f64 {
        (i + 1) as f64 * self.spacing
    }

    /// `sin((i + 1) h)`
    #[inline]
    pub fn sample(&self, i: usize) -> f64 {
        self.position(i).sin()
    }

    /// Closed-form derivative of [`Grid::sample`]: `cos((i + 1) h)`.
    #[inline]
    pub fn derivative(&self, i: usize) -> f64 {
        self.position(i).cos()
    }

    /// Host input buffer. Every element is computed independently, so the
    /// result is identical to a sequential fill.
    pub fn init_signal(&self) -> Result<Vec<f64>> {
        let mut signal = host_buffer(self.num_elements, 0.0, "signal initialization")?;
        signal
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, x)| *x = self.sample(i));
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StencilError;

    #[test]
    fn spacing_covers_one_period() {
        let g = Grid::new(8);
        assert!((g.spacing - PI / 4.0).abs() < 1e-15);
        assert!((g.position(7) - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn signal_matches_sine_samples() {
        let g = Grid::new(8);
        let signal = g.init_signal().unwrap();
        assert_eq!(signal.len(), 8);
        for (i, v) in signal.iter().enumerate() {
            assert_eq!(*v, ((i + 1) as f64 * g.spacing).sin());
        }
        assert!((signal[1] - 1.0).abs() < 1e-15);
        assert!(signal[7].abs() < 1e-12);
    }

    #[test]
    fn oversized_signal_reports_allocation_failure() {
        let g = Grid::new(usize::MAX / 4);
        assert!(matches!(g.init_signal(), Err(StencilError::MemoryAllocation(_))));
    }
}
