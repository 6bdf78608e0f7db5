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

//! Error taxonomy for the stencil benchmarks.
//!
//! Allocation, transfer and launch failures are the three boundary errors a
//! run can hit on the device; all of them are fatal to the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StencilError {
    #[error("CUDA error: {0}")]
    Cuda(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Memory allocation failed: {0}")]
    MemoryAllocation(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Kernel launch failed: {0}")]
    KernelLaunch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StencilError>;

/// Human-readable name for a CUDA runtime error code.
pub fn cuda_error_to_string(code: i32) -> &'static str {
    match code {
        0 => "cudaSuccess",
        1 => "cudaErrorInvalidValue",
        2 => "cudaErrorMemoryAllocation",
        3 => "cudaErrorInitializationError",
        9 => "cudaErrorInvalidConfiguration",
        30 => "cudaErrorUnknown",
        35 => "cudaErrorInsufficientDriver",
        98 => "cudaErrorInvalidDeviceFunction",
        100 => "cudaErrorNoDevice",
        209 => "cudaErrorNoKernelImageForDevice",
        999 => "CUDA unavailable (kernels built without nvcc)",
        _ => "Unknown CUDA error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_detail() {
        let err = StencilError::KernelLaunch("code 9".into());
        assert_eq!(err.to_string(), "Kernel launch failed: code 9");
        let err = StencilError::Transfer("H2D".into());
        assert_eq!(err.to_string(), "Transfer failed: H2D");
    }

    #[test]
    fn known_codes_have_names() {
        assert_eq!(cuda_error_to_string(0), "cudaSuccess");
        assert_eq!(cuda_error_to_string(9), "cudaErrorInvalidConfiguration");
        assert_eq!(cuda_error_to_string(12345), "Unknown CUDA error");
    }
}
