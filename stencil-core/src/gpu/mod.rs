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

//! Device abstraction for the stencil pipeline.
//!
//! A [`StencilDevice`] owns the upload / launch / synchronize / download
//! steps of one benchmark run. [`CudaStencilDevice`] drives a real GPU;
//! [`HostStencilDevice`] runs the same launch geometry on the CPU.

pub mod cuda;
pub mod host;
pub mod memory;

pub use cuda::{CudaStencilDevice, cuda_available};
pub use host::HostStencilDevice;
pub use memory::GpuSignalBuffer;

use crate::error::{Result, StencilError};
use crate::stencil::StencilKind;

/// Work-items per group for every launch.
pub const THREADS_PER_BLOCK: u32 = 1024;

/// 1-D launch configuration: `blocks * threads_per_block >= N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchGeometry {
    pub blocks: u32,
    pub threads_per_block: u32,
}

impl LaunchGeometry {
    /// `ceil(N / 1024)` groups of 1024 work-items.
    pub fn for_elements(num_elements: usize) -> Result<Self> {
        if num_elements == 0 {
            return Err(StencilError::InvalidInput(
                "cannot launch over zero elements".to_string(),
            ));
        }
        let blocks = num_elements.div_ceil(THREADS_PER_BLOCK as usize);
        let blocks = u32::try_from(blocks).map_err(|_| {
            StencilError::InvalidInput(format!(
                "{} elements need {} blocks, more than a 1-D grid allows",
                num_elements, blocks
            ))
        })?;
        Ok(Self {
            blocks,
            threads_per_block: THREADS_PER_BLOCK,
        })
    }

    /// Number of work-items launched.
    pub fn work_items(&self) -> usize {
        self.blocks as usize * self.threads_per_block as usize
    }

    pub fn covers(&self, num_elements: usize) -> bool {
        self.threads_per_block > 0 && self.work_items() >= num_elements
    }
}

/// Identification of the device a run executes on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProperties {
    pub name: String,
    pub major: i32,
    pub minor: i32,
    pub ordinal: usize,
    pub total_memory_bytes: Option<usize>,
}

/// One device's view of the pipeline. Buffers free themselves on drop.
pub trait StencilDevice {
    type Buffer;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;

    fn properties(&self) -> &DeviceProperties;

    /// Allocate a device buffer and copy `host` into it.
    fn upload(&self, host: &[f64]) -> Result<Self::Buffer>;

    /// Allocate an output buffer of `len` elements; contents unspecified.
    fn alloc_output(&self, len: usize) -> Result<Self::Buffer>;

    /// Enqueue the stencil kernel. `spacing` is already the launch spacing
    /// for `kind`. May return before the kernel finishes.
    fn launch(
        &self,
        kind: StencilKind,
        input: &Self::Buffer,
        output: &mut Self::Buffer,
        spacing: f64,
        geometry: LaunchGeometry,
    ) -> Result<()>;

    /// Block until every launched kernel has completed.
    fn synchronize(&self) -> Result<()>;

    /// Copy a device buffer back into `host` (lengths must match).
    fn download(&self, buffer: &Self::Buffer, host: &mut [f64]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rounds_up() {
        let g = LaunchGeometry::for_elements(180_000_000).unwrap();
        assert_eq!(g.blocks, 175_782);
        assert_eq!(g.threads_per_block, 1024);
        assert!(g.covers(180_000_000));

        let g = LaunchGeometry::for_elements(1024).unwrap();
        assert_eq!(g.blocks, 1);
        let g = LaunchGeometry::for_elements(1025).unwrap();
        assert_eq!(g.blocks, 2);
        let g = LaunchGeometry::for_elements(8).unwrap();
        assert_eq!(g.blocks, 1);
    }

    #[test]
    fn geometry_rejects_empty() {
        assert!(matches!(
            LaunchGeometry::for_elements(0),
            Err(StencilError::InvalidInput(_))
        ));
    }

    #[test]
    fn covers_detects_short_grids() {
        let g = LaunchGeometry {
            blocks: 1,
            threads_per_block: 1024,
        };
        assert!(g.covers(1024));
        assert!(!g.covers(1025));
    }
}
