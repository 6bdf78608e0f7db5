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

//! CUDA backend: cudarc for device management and copies, `stencil-kernels`
//! for the kernel launches.

use std::ffi::c_void;
use std::sync::Arc;

use cudarc::driver::CudaDevice;
use cudarc::driver::sys::CUdevice_attribute;

use super::memory::{GpuSignalBuffer, bytes_to_mib, query_device_mem_info};
use super::{DeviceProperties, LaunchGeometry, StencilDevice};
use crate::error::{Result, StencilError, cuda_error_to_string};
use crate::stencil::StencilKind;

/// True when the kernels were compiled with nvcc and a CUDA device can be opened.
pub fn cuda_available() -> bool {
    if !stencil_kernels::kernels_available() {
        return false;
    }
    // cudarc panics when libcuda cannot be loaded.
    matches!(std::panic::catch_unwind(CudaDevice::count), Ok(Ok(n)) if n > 0)
}

pub struct CudaStencilDevice {
    device: Arc<CudaDevice>,
    properties: DeviceProperties,
}

impl CudaStencilDevice {
    /// Open device `device_id` and read its properties.
    pub fn new(device_id: usize) -> Result<Self> {
        if !stencil_kernels::kernels_available() {
            return Err(StencilError::Cuda(
                "stencil kernels were built without nvcc; rebuild with the CUDA toolkit or set STENCIL_BACKEND=host"
                    .to_string(),
            ));
        }

        let device = std::panic::catch_unwind(|| CudaDevice::new(device_id))
            .map_err(|_| {
                StencilError::Cuda("CUDA driver library (libcuda) could not be loaded".to_string())
            })?
            .map_err(|e| {
                StencilError::Cuda(format!(
                    "Failed to initialize CUDA device {}: {:?}",
                    device_id, e
                ))
            })?;

        let properties = Self::query_properties(&device)?;
        log::info!(
            "CUDA device {} initialized: {} (SM {}.{})",
            properties.ordinal,
            properties.name,
            properties.major,
            properties.minor
        );
        if let Some(total) = properties.total_memory_bytes {
            log::info!(
                "CUDA device {} memory: {:.2} MiB total",
                properties.ordinal,
                bytes_to_mib(total)
            );
        }

        Ok(Self { device, properties })
    }

    fn query_properties(device: &Arc<CudaDevice>) -> Result<DeviceProperties> {
        crate::profile_scope!("GPU::DeviceQuery");
        let attr = |a: CUdevice_attribute| {
            device.attribute(a).map_err(|e| {
                StencilError::Cuda(format!("cuDeviceGetAttribute({:?}) failed: {:?}", a, e))
            })
        };
        let major = attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)?;
        let minor = attr(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)?;
        let name = device
            .name()
            .map_err(|e| StencilError::Cuda(format!("cuDeviceGetName failed: {:?}", e)))?;
        let total_memory_bytes = query_device_mem_info(device).ok().map(|(_, total)| total);

        Ok(DeviceProperties {
            name,
            major,
            minor,
            ordinal: device.ordinal(),
            total_memory_bytes,
        })
    }

}

impl StencilDevice for CudaStencilDevice {
    type Buffer = GpuSignalBuffer;

    fn backend_name(&self) -> &'static str {
        "cuda"
    }

    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    fn upload(&self, host: &[f64]) -> Result<GpuSignalBuffer> {
        GpuSignalBuffer::from_host(&self.device, host, "input upload")
    }

    fn alloc_output(&self, len: usize) -> Result<GpuSignalBuffer> {
        GpuSignalBuffer::uninitialized(&self.device, len, "output allocation")
    }

    fn launch(
        &self,
        kind: StencilKind,
        input: &GpuSignalBuffer,
        output: &mut GpuSignalBuffer,
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
        if input.is_empty() {
            return Err(StencilError::KernelLaunch(
                "refusing to launch over an empty buffer".to_string(),
            ));
        }
        let n = input.len();
        let in_ptr = input.ptr();
        let out_ptr = output.ptr_mut();

        let ret = unsafe {
            match kind {
                StencilKind::TwoPoint => stencil_kernels::launch_stencil_2pt(
                    in_ptr,
                    out_ptr,
                    spacing,
                    n,
                    geometry.blocks,
                    geometry.threads_per_block,
                    std::ptr::null_mut::<c_void>(), // default stream
                ),
                StencilKind::FivePoint => stencil_kernels::launch_stencil_5pt(
                    in_ptr,
                    out_ptr,
                    spacing,
                    n,
                    geometry.blocks,
                    geometry.threads_per_block,
                    std::ptr::null_mut::<c_void>(),
                ),
            }
        };

        if ret != 0 {
            return Err(StencilError::KernelLaunch(format!(
                "{} stencil kernel failed with CUDA error code: {} ({})",
                kind.name(),
                ret,
                cuda_error_to_string(ret)
            )));
        }
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        self.device
            .synchronize()
            .map_err(|e| StencilError::Cuda(format!("CUDA device synchronize failed: {:?}", e)))
    }

    fn download(&self, buffer: &GpuSignalBuffer, host: &mut [f64]) -> Result<()> {
        buffer.copy_to_host(&self.device, host)
    }
}
