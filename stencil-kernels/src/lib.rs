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

// FFI interface for the stencil kernels
// Kernels in src/stencil.cu, compiled via build.rs
// Stub launchers provided when nvcc is unavailable

use std::ffi::c_void;

/// Return code of the stub launchers (no CUDA toolchain at build time).
pub const CUDA_UNAVAILABLE: i32 = 999;

/// Whether the real kernels were compiled into this build.
pub const fn kernels_available() -> bool {
    cfg!(not(stencil_no_cuda))
}

#[cfg(not(stencil_no_cuda))]
unsafe extern "C" {
    /// Launch the two-point forward-difference kernel
    /// Returns CUDA error code (0 = success)
    ///
    /// # Safety
    /// `in_d` and `out_d` must be device pointers to at least `n` doubles,
    /// and must stay alive until the stream is synchronized.
    pub fn launch_stencil_2pt(
        in_d: *const f64,
        out_d: *mut f64,
        h: f64,
        n: usize,
        blocks: u32,
        threads_per_block: u32,
        stream: *mut c_void,
    ) -> i32;

    /// Launch the five-point central-difference kernel
    /// Returns CUDA error code (0 = success)
    ///
    /// `h12` is the grid spacing already multiplied by 12.
    ///
    /// # Safety
    /// Same pointer requirements as [`launch_stencil_2pt`].
    pub fn launch_stencil_5pt(
        in_d: *const f64,
        out_d: *mut f64,
        h12: f64,
        n: usize,
        blocks: u32,
        threads_per_block: u32,
        stream: *mut c_void,
    ) -> i32;
}

/// Stub launcher (allows compilation without nvcc)
///
/// # Safety
/// Never dereferences its arguments.
#[cfg(stencil_no_cuda)]
pub unsafe fn launch_stencil_2pt(
    _in_d: *const f64,
    _out_d: *mut f64,
    _h: f64,
    _n: usize,
    _blocks: u32,
    _threads_per_block: u32,
    _stream: *mut c_void,
) -> i32 {
    CUDA_UNAVAILABLE
}

/// Stub launcher (allows compilation without nvcc)
///
/// # Safety
/// Never dereferences its arguments.
#[cfg(stencil_no_cuda)]
pub unsafe fn launch_stencil_5pt(
    _in_d: *const f64,
    _out_d: *mut f64,
    _h12: f64,
    _n: usize,
    _blocks: u32,
    _threads_per_block: u32,
    _stream: *mut c_void,
) -> i32 {
    CUDA_UNAVAILABLE
}
