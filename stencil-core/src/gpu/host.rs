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

//! CPU backend with the same launch geometry as the GPU: the output is cut
//! into groups of `threads_per_block` slots, groups run on the rayon pool and
//! each work-item writes only its own slot.

use rayon::prelude::*;

use super::{DeviceProperties, LaunchGeometry, StencilDevice};
use crate::error::{Result, StencilError};
use crate::stencil::StencilKind;

/// Buffer fill for freshly allocated outputs, so unwritten slots stand out.
pub const UNWRITTEN: f64 = f64::NAN;

pub struct HostStencilDevice {
    properties: DeviceProperties,
}

impl Default for HostStencilDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HostStencilDevice {
    pub fn new() -> Self {
        Self {
            properties: DeviceProperties {
                name: format!("host ({} rayon threads)", rayon::current_num_threads()),
                major: 0,
                minor: 0,
                ordinal: 0,
                total_memory_bytes: None,
            },
        }
    }
}

fn try_alloc(len: usize, context: &str) -> Result<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        StencilError::MemoryAllocation(format!(
            "host allocation of {} elements failed during {}: {}",
            len, context, e
        ))
    })?;
    Ok(buf)
}

/// `len` elements set to `fill`, or `MemoryAllocation` if the host cannot
/// provide them.
pub(crate) fn host_buffer(len: usize, fill: f64, context: &str) -> Result<Vec<f64>> {
    let mut buf = try_alloc(len, context)?;
    buf.resize(len, fill);
    Ok(buf)
}

impl StencilDevice for HostStencilDevice {
    type Buffer = Vec<f64>;

    fn backend_name(&self) -> &'static str {
        "host"
    }

    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    fn upload(&self, host: &[f64]) -> Result<Vec<f64>> {
        let mut buf = try_alloc(host.len(), "input upload")?;
        buf.extend_from_slice(host);
        Ok(buf)
    }

    fn alloc_output(&self, len: usize) -> Result<Vec<f64>> {
        host_buffer(len, UNWRITTEN, "output allocation")
    }

    fn launch(
        &self,
        kind: StencilKind,
        input: &Vec<f64>,
        output: &mut Vec<f64>,
        spacing: f64,
        geometry: LaunchGeometry,
    ) -> Result<()> {
        if input.len() != output.len() {
            return Err(StencilError::KernelLaunch(format!(
                "input has {} elements but output has {}",
                input.len(),
                output.len()
            )));
        }
        if !geometry.covers(input.len()) {
            return Err(StencilError::KernelLaunch(format!(
                "invalid configuration: {} blocks x {} threads do not cover {} elements",
                geometry.blocks,
                geometry.threads_per_block,
                input.len()
            )));
        }

        let group = geometry.threads_per_block as usize;
        output
            .par_chunks_mut(group)
            .enumerate()
            .for_each(|(block, slots)| {
                let base = block * group;
                for (thread, slot) in slots.iter_mut().enumerate() {
                    if let Some(v) = kind.evaluate(input, base + thread, spacing) {
                        *slot = v;
                    }
                }
            });
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        // launch() returns only after every group has finished.
        Ok(())
    }

    fn download(&self, buffer: &Vec<f64>, host: &mut [f64]) -> Result<()> {
        if host.len() != buffer.len() {
            return Err(StencilError::Transfer(format!(
                "D2H length mismatch: device buffer has {} elements, host buffer {}",
                buffer.len(),
                host.len()
            )));
        }
        host.copy_from_slice(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn matches_single_threaded_reference() {
        let grid = Grid::new(5000);
        let input = grid.init_signal().unwrap();
        let dev = HostStencilDevice::new();
        for kind in [StencilKind::TwoPoint, StencilKind::FivePoint] {
            let spacing = kind.launch_spacing(grid.spacing);
            let d_in = dev.upload(&input).unwrap();
            let mut d_out = dev.alloc_output(input.len()).unwrap();
            let geometry = LaunchGeometry::for_elements(input.len()).unwrap();
            dev.launch(kind, &d_in, &mut d_out, spacing, geometry).unwrap();
            dev.synchronize().unwrap();

            let mut expected = vec![UNWRITTEN; input.len()];
            kind.apply(&input, spacing, &mut expected);
            for (a, b) in d_out.iter().zip(&expected) {
                assert!(a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()));
            }
        }
    }

    #[test]
    fn rejects_short_grid() {
        let dev = HostStencilDevice::new();
        let d_in = dev.upload(&[0.0; 2048]).unwrap();
        let mut d_out = dev.alloc_output(2048).unwrap();
        let geometry = LaunchGeometry {
            blocks: 1,
            threads_per_block: 1024,
        };
        let err = dev
            .launch(StencilKind::TwoPoint, &d_in, &mut d_out, 1.0, geometry)
            .unwrap_err();
        assert!(matches!(err, StencilError::KernelLaunch(_)));
    }

    #[test]
    fn download_checks_length() {
        let dev = HostStencilDevice::new();
        let buf = dev.alloc_output(4).unwrap();
        let mut host = vec![0.0; 3];
        assert!(matches!(
            dev.download(&buf, &mut host),
            Err(StencilError::Transfer(_))
        ));
    }

    #[test]
    fn oversized_output_reports_allocation_failure() {
        let dev = HostStencilDevice::new();
        assert!(matches!(
            dev.alloc_output(usize::MAX / 4),
            Err(StencilError::MemoryAllocation(_))
        ));
    }
}
