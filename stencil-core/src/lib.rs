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

//! One-dimensional finite-difference stencil benchmarks.
//!
//! Two first-derivative stencils (two-point forward difference and
//! five-point central difference) are applied once to `sin((i+1)h)` on a GPU,
//! timed, and checked against `cos((i+1)h)`. The same pipeline runs on a CPU
//! backend so the numerics can be tested without a device.

#[macro_use]
pub mod profiling;

pub mod bench;
pub mod config;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod stencil;
pub mod validate;

pub use bench::{BenchReport, KernelRun, execute, run_benchmark, run_from_env};
pub use config::{BackendKind, BenchConfig};
pub use error::{Result, StencilError, cuda_error_to_string};
pub use gpu::{
    CudaStencilDevice, DeviceProperties, HostStencilDevice, LaunchGeometry, StencilDevice,
    THREADS_PER_BLOCK, cuda_available,
};
pub use grid::Grid;
pub use stencil::StencilKind;
pub use validate::{ErrorDivisor, mean_abs_error};
