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

//! One benchmark run: INIT → UPLOAD → COMPUTE → DOWNLOAD → VALIDATE → TEARDOWN.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::config::{BackendKind, BenchConfig};
use crate::error::{Result, StencilError};
use crate::gpu::host::host_buffer;
use crate::gpu::{
    CudaStencilDevice, DeviceProperties, HostStencilDevice, LaunchGeometry, StencilDevice,
};
use crate::grid::Grid;
use crate::stencil::StencilKind;
use crate::validate::mean_abs_error;

/// Result of a single kernel execution on a device.
pub struct KernelRun {
    /// Downloaded output; only `kind.valid_range(N)` holds stencil values.
    pub output: Vec<f64>,
    /// Launch + synchronize, wall clock.
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct BenchReport {
    pub kind: StencilKind,
    pub device: DeviceProperties,
    pub geometry: LaunchGeometry,
    pub num_elements: usize,
    pub elapsed_ms: f64,
    pub mean_abs_error: f64,
    /// One read and one write of N doubles over the kernel time.
    pub bandwidth_gb_s: f64,
}

/// Upload `input`, run `kind` once, wait for it and copy the result back.
/// Device buffers are released before returning.
/// Six significant digits with trailing zeros removed; scientific notation
/// below 1e-4 or from 1e6 up, with a signed exponent of at least two digits
/// (`1.74533e-08`). This is the default iostream rendering of a double.
pub fn format_general(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let sci = format!("{:.5e}", value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return sci;
    };
    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

pub fn execute<D: StencilDevice>(
    device: &D,
    kind: StencilKind,
    grid: &Grid,
    input: &[f64],
    geometry: LaunchGeometry,
) -> Result<KernelRun> {
    if input.len() != grid.num_elements {
        return Err(StencilError::InvalidInput(format!(
            "input has {} elements, grid expects {}",
            input.len(),
            grid.num_elements
        )));
    }

    let d_in = {
        crate::profile_scope!("Stencil::Upload");
        device.upload(input)?
    };
    let mut d_out = {
        crate::profile_scope!("Stencil::AllocOutput");
        device.alloc_output(input.len())?
    };
    log::debug!(
        "{}: uploaded {} elements, output allocated",
        device.backend_name(),
        input.len()
    );

    // 12h pre-scaling for the five-point kernel happens here, not in the kernel.
    let spacing = kind.launch_spacing(grid.spacing);

    let elapsed = {
        crate::profile_scope!("Stencil::Compute");
        let begin = Instant::now();
        device.launch(kind, &d_in, &mut d_out, spacing, geometry)?;
        device.synchronize()?;
        begin.elapsed()
    };

    let mut output = host_buffer(input.len(), 0.0, "output download")?;
    {
        crate::profile_scope!("Stencil::Download");
        device.download(&d_out, &mut output)?;
    }

    {
        crate::profile_scope!("Stencil::Teardown");
        drop(d_in);
        drop(d_out);
    }

    Ok(KernelRun { output, elapsed })
}

/// Full benchmark on `device`, writing the console report to `out` as each
/// phase completes.
pub fn run_benchmark<D: StencilDevice, W: Write>(
    device: &D,
    kind: StencilKind,
    config: &BenchConfig,
    out: &mut W,
) -> Result<BenchReport> {
    config.validate(kind)?;
    let props = device.properties().clone();
    writeln!(out, " System minor {}", props.minor)?;
    writeln!(out, " System major {}", props.major)?;
    writeln!(out, " System name {}", props.name)?;

    let grid = Grid::new(config.num_elements);
    log::info!(
        "{} stencil ({}) on {} backend: N = {}, h = {:e}",
        kind.name(),
        kind.description(),
        device.backend_name(),
        grid.num_elements,
        grid.spacing
    );

    writeln!(out, "Initializing ...")?;
    let input = {
        crate::profile_scope!("Stencil::Init");
        grid.init_signal()?
    };

    let geometry = LaunchGeometry::for_elements(grid.num_elements)?;
    writeln!(
        out,
        "Running {} blocks, {} threads/block",
        geometry.blocks, geometry.threads_per_block
    )?;
    out.flush()?;

    let run = execute(device, kind, &grid, &input, geometry)?;
    let elapsed_ms = run.elapsed.as_secs_f64() * 1e3;
    writeln!(out, "Elapsed time: {} ms.", format_general(elapsed_ms))?;

    let mae = {
        crate::profile_scope!("Stencil::Validate");
        mean_abs_error(
            &run.output,
            &grid,
            kind.valid_range(grid.num_elements),
            config.error_divisor,
        )?
    };
    writeln!(out, "Error: {}", format_general(mae))?;

    let bytes_moved = 2 * grid.num_elements * std::mem::size_of::<f64>();
    let bandwidth_gb_s = if elapsed_ms > 0.0 {
        bytes_moved as f64 / (elapsed_ms * 1e-3) / 1e9
    } else {
        0.0
    };
    log::info!(
        "{} stencil: {:.3} ms, {:.2} GB/s effective, mean |error| {:e} ({:?})",
        kind.name(),
        elapsed_ms,
        bandwidth_gb_s,
        mae,
        config.error_divisor
    );

    drop(run);
    drop(input);

    Ok(BenchReport {
        kind,
        device: props,
        geometry,
        num_elements: grid.num_elements,
        elapsed_ms,
        mean_abs_error: mae,
        bandwidth_gb_s,
    })
}

/// Read the config from the environment, open the configured backend and
/// run `kind`, reporting to stdout.
pub fn run_from_env(kind: StencilKind) -> Result<BenchReport> {
    let config = BenchConfig::from_env();
    config.validate(kind)?;
    log::debug!("resolved config: {:?}", config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match config.backend {
        BackendKind::Cuda => {
            let device = CudaStencilDevice::new(config.device_id)?;
            run_benchmark(&device, kind, &config, &mut out)
        }
        BackendKind::Host => {
            let device = HostStencilDevice::new();
            run_benchmark(&device, kind, &config, &mut out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ErrorDivisor;

    #[test]
    fn report_lines_in_order() {
        let config = BenchConfig::default()
            .with_num_elements(4096)
            .with_backend(BackendKind::Host);
        let mut out = Vec::new();
        let report =
            run_benchmark(&HostStencilDevice::new(), StencilKind::TwoPoint, &config, &mut out)
                .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], " System minor 0");
        assert_eq!(lines[1], " System major 0");
        assert!(lines[2].starts_with(" System name host"));
        assert_eq!(lines[3], "Initializing ...");
        assert_eq!(lines[4], "Running 4 blocks, 1024 threads/block");
        assert!(lines[5].starts_with("Elapsed time: ") && lines[5].ends_with(" ms."));
        assert!(lines[6].starts_with("Error: "));
        assert_eq!(report.geometry.blocks, 4);
        assert!(report.mean_abs_error > 0.0 && report.mean_abs_error < 1e-2);
    }

    #[test]
    fn numbers_print_like_iostream() {
        assert_eq!(format_general(1.745_329_25e-8), "1.74533e-08");
        assert_eq!(format_general(2.0e-10), "2e-10");
        assert_eq!(format_general(3.2e-5), "3.2e-05");
        assert_eq!(format_general(0.0015), "0.0015");
        assert_eq!(format_general(12.345_678), "12.3457");
        assert_eq!(format_general(250.0), "250");
        assert_eq!(format_general(123_456_789.0), "1.23457e+08");
        assert_eq!(format_general(0.0), "0");
    }

    #[test]
    fn invalid_config_fails_before_output() {
        let config = BenchConfig::default().with_num_elements(3);
        let mut out = Vec::new();
        let dev = HostStencilDevice::new();
        let err = run_benchmark(&dev, StencilKind::FivePoint, &config, &mut out).unwrap_err();
        assert!(matches!(err, StencilError::InvalidInput(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn valid_count_divisor_is_larger_for_five_point() {
        let base = BenchConfig::default().with_num_elements(64);
        let dev = HostStencilDevice::new();
        let legacy =
            run_benchmark(&dev, StencilKind::FivePoint, &base, &mut std::io::sink()).unwrap();
        let valid = run_benchmark(
            &dev,
            StencilKind::FivePoint,
            &base.clone().with_error_divisor(ErrorDivisor::ValidCount),
            &mut std::io::sink(),
        )
        .unwrap();
        let ratio = valid.mean_abs_error / legacy.mean_abs_error;
        assert!((ratio - 63.0 / 60.0).abs() < 1e-12, "ratio {ratio}");
    }

    #[test]
    fn execute_rejects_mismatched_input() {
        let grid = Grid::new(16);
        let geometry = LaunchGeometry::for_elements(16).unwrap();
        let err = execute(
            &HostStencilDevice::new(),
            StencilKind::TwoPoint,
            &grid,
            &[0.0; 8],
            geometry,
        )
        .err()
        .unwrap();
        assert!(matches!(err, StencilError::InvalidInput(_)));
    }
}
