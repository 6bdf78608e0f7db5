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

// CUDA backend against the host reference. Skips when no device is present
// or the kernels were built without nvcc.

use stencil_core::{
    BenchConfig, CudaStencilDevice, ErrorDivisor, Grid, HostStencilDevice, LaunchGeometry,
    StencilDevice, StencilError, StencilKind, cuda_available, execute, run_benchmark,
};

fn cuda_or_skip(test: &str) -> Option<CudaStencilDevice> {
    if !cuda_available() {
        eprintln!("[{test}] skipped - no CUDA device");
        return None;
    }
    Some(CudaStencilDevice::new(0).unwrap())
}

#[test]
fn cuda_matches_host_reference() {
    let Some(dev) = cuda_or_skip("cuda_matches_host_reference") else {
        return;
    };
    let n = 1_000_003;
    let grid = Grid::new(n);
    let input = grid.init_signal().unwrap();
    let geometry = LaunchGeometry::for_elements(n).unwrap();

    for kind in [StencilKind::TwoPoint, StencilKind::FivePoint] {
        let gpu = execute(&dev, kind, &grid, &input, geometry).unwrap();
        let cpu = execute(&HostStencilDevice::new(), kind, &grid, &input, geometry).unwrap();
        for i in kind.valid_range(n) {
            assert_eq!(
                gpu.output[i].to_bits(),
                cpu.output[i].to_bits(),
                "{} index {i}: gpu {} cpu {}",
                kind.name(),
                gpu.output[i],
                cpu.output[i]
            );
        }
    }
}

#[test]
fn cuda_runs_are_idempotent() {
    let Some(dev) = cuda_or_skip("cuda_runs_are_idempotent") else {
        return;
    };
    let grid = Grid::new(65_536);
    let input = grid.init_signal().unwrap();
    let geometry = LaunchGeometry::for_elements(grid.num_elements).unwrap();
    let a = execute(&dev, StencilKind::FivePoint, &grid, &input, geometry).unwrap();
    let b = execute(&dev, StencilKind::FivePoint, &grid, &input, geometry).unwrap();
    let range = StencilKind::FivePoint.valid_range(grid.num_elements);
    assert_eq!(a.output[range.clone()], b.output[range]);
}

#[test]
fn cuda_benchmark_reports_device() {
    let Some(dev) = cuda_or_skip("cuda_benchmark_reports_device") else {
        return;
    };
    let config = BenchConfig::default()
        .with_num_elements(1 << 20)
        .with_error_divisor(ErrorDivisor::ValidCount);
    let mut out = Vec::new();
    let report = run_benchmark(&dev, StencilKind::TwoPoint, &config, &mut out).unwrap();
    assert!(report.device.major > 0);
    assert!(!report.device.name.is_empty());
    assert!(report.mean_abs_error < 1e-5);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!(" System name {}", report.device.name)));
    assert!(text.contains("Running 1024 blocks, 1024 threads/block"));
}

#[test]
fn short_launch_grid_is_rejected() {
    let Some(dev) = cuda_or_skip("short_launch_grid_is_rejected") else {
        return;
    };
    let input = vec![0.0; 4096];
    let d_in = dev.upload(&input).unwrap();
    let mut d_out = dev.alloc_output(input.len()).unwrap();
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
fn missing_kernels_are_reported_as_cuda_error() {
    if stencil_kernels::kernels_available() {
        return;
    }
    let err = CudaStencilDevice::new(0).err().unwrap();
    assert!(matches!(err, StencilError::Cuda(_)));
}
