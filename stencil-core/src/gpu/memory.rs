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

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaSlice, DevicePtr, DevicePtrMut};

use crate::error::{Result, StencilError};

pub(crate) fn bytes_to_mib(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// (free, total) bytes on the device bound to `device`.
pub(crate) fn query_device_mem_info(device: &Arc<CudaDevice>) -> Result<(usize, usize)> {
    device
        .bind_to_thread()
        .map_err(|e| StencilError::Cuda(format!("Failed to bind CUDA context: {:?}", e)))?;
    cudarc::driver::result::mem_get_info()
        .map_err(|e| StencilError::Cuda(format!("cuMemGetInfo failed: {:?}", e)))
}

fn build_oom_message(context: &str, requested_bytes: usize, free: usize, total: usize) -> String {
    format!(
        "GPU out of memory during {context}: requested {:.2} MiB, free {:.2} MiB / total {:.2} MiB. Reduce STENCIL_NUM_ELEMENTS and retry.",
        bytes_to_mib(requested_bytes),
        bytes_to_mib(free),
        bytes_to_mib(total),
    )
}

/// Guard that checks available GPU memory before attempting a large allocation.
///
/// Returns a MemoryAllocation error with a helpful message when the request
/// exceeds the currently reported free memory.
pub(crate) fn ensure_device_memory_available(
    device: &Arc<CudaDevice>,
    requested_bytes: usize,
    context: &str,
) -> Result<()> {
    let (free, total) = query_device_mem_info(device)?;

    if requested_bytes > free {
        return Err(StencilError::MemoryAllocation(build_oom_message(
            context,
            requested_bytes,
            free,
            total,
        )));
    }

    Ok(())
}

/// Wraps CUDA allocation errors with an OOM-aware StencilError.
pub(crate) fn map_allocation_error(
    device: &Arc<CudaDevice>,
    requested_bytes: usize,
    context: &str,
    source: impl std::fmt::Debug,
) -> StencilError {
    match query_device_mem_info(device) {
        Ok((free, total)) if requested_bytes > free => StencilError::MemoryAllocation(
            build_oom_message(context, requested_bytes, free, total),
        ),
        Ok(_) => StencilError::MemoryAllocation(format!(
            "GPU allocation failed during {context}: requested {:.2} MiB. CUDA error: {:?}",
            bytes_to_mib(requested_bytes),
            source,
        )),
        Err(e) => StencilError::MemoryAllocation(format!(
            "GPU allocation failed during {context}: requested {:.2} MiB. Unable to fetch memory info: {:?}; CUDA error: {:?}",
            bytes_to_mib(requested_bytes),
            e,
            source,
        )),
    }
}

/// Linear `f64` buffer in device memory
///
/// Freed when dropped. Exclusively owned by the run that allocated it.
pub struct GpuSignalBuffer {
    slice: CudaSlice<f64>,
    len: usize,
}

impl GpuSignalBuffer {
    /// Allocate `len` doubles without initializing them.
    pub fn uninitialized(device: &Arc<CudaDevice>, len: usize, context: &str) -> Result<Self> {
        let requested_bytes = len
            .checked_mul(std::mem::size_of::<f64>())
            .ok_or_else(|| {
                StencilError::MemoryAllocation(format!("Size overflow: {} elements", len))
            })?;

        ensure_device_memory_available(device, requested_bytes, context)?;

        let slice = unsafe { device.alloc::<f64>(len) }
            .map_err(|e| map_allocation_error(device, requested_bytes, context, e))?;

        Ok(Self { slice, len })
    }

    /// Allocate and fill from host memory (synchronous H2D copy).
    pub fn from_host(device: &Arc<CudaDevice>, host: &[f64], context: &str) -> Result<Self> {
        let mut buffer = Self::uninitialized(device, host.len(), context)?;
        device
            .htod_sync_copy_into(host, &mut buffer.slice)
            .map_err(|e| {
                StencilError::Transfer(format!(
                    "H2D copy of {:.2} MiB failed during {context}: {:?}",
                    bytes_to_mib(buffer.size_bytes()),
                    e
                ))
            })?;
        Ok(buffer)
    }

    /// Synchronous D2H copy of the whole buffer.
    pub fn copy_to_host(&self, device: &Arc<CudaDevice>, host: &mut [f64]) -> Result<()> {
        if host.len() != self.len {
            return Err(StencilError::Transfer(format!(
                "D2H length mismatch: device buffer has {} elements, host buffer {}",
                self.len,
                host.len()
            )));
        }
        device.dtoh_sync_copy_into(&self.slice, host).map_err(|e| {
            StencilError::Transfer(format!(
                "D2H copy of {:.2} MiB failed: {:?}",
                bytes_to_mib(self.size_bytes()),
                e
            ))
        })
    }

    /// Raw device pointer for FFI.
    ///
    /// # Safety
    /// Valid only while the buffer is alive
    pub fn ptr(&self) -> *const f64 {
        *self.slice.device_ptr() as *const f64
    }

    /// Mutable raw device pointer for FFI.
    pub fn ptr_mut(&mut self) -> *mut f64 {
        *self.slice.device_ptr_mut() as *mut f64
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.len * std::mem::size_of::<f64>()
    }
}
