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

//! Benchmark configuration from the environment.
//!
//! **Env:** `STENCIL_NUM_ELEMENTS` (sample count N, default 180,000,000),
//! `STENCIL_DEVICE_ID` (CUDA ordinal, default 0), `STENCIL_BACKEND`
//! (`cuda` or `host`, default `cuda`), `STENCIL_ERROR_DIVISOR` (`n-1`/`legacy`
//! or `valid`, default `n-1`). Unset or unparsable values keep the default;
//! the resolved config is then checked against the stencil with [`BenchConfig::validate`].

use crate::error::{Result, StencilError};
use crate::gpu::LaunchGeometry;
use crate::stencil::StencilKind;
use crate::validate::ErrorDivisor;

pub const DEFAULT_NUM_ELEMENTS: usize = 180_000_000;

pub const ENV_NUM_ELEMENTS: &str = "STENCIL_NUM_ELEMENTS";
pub const ENV_DEVICE_ID: &str = "STENCIL_DEVICE_ID";
pub const ENV_BACKEND: &str = "STENCIL_BACKEND";
pub const ENV_ERROR_DIVISOR: &str = "STENCIL_ERROR_DIVISOR";

/// Where the kernel runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Cuda,
    /// CPU reference backend; same launch geometry, dispatched with rayon.
    Host,
}

impl BackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("cuda") || s.eq_ignore_ascii_case("gpu") {
            Some(BackendKind::Cuda)
        } else if s.eq_ignore_ascii_case("host") || s.eq_ignore_ascii_case("cpu") {
            Some(BackendKind::Host)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    pub num_elements: usize,
    pub device_id: usize,
    pub backend: BackendKind,
    pub error_divisor: ErrorDivisor,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            num_elements: DEFAULT_NUM_ELEMENTS,
            device_id: 0,
            backend: BackendKind::Cuda,
            error_divisor: ErrorDivisor::SampleCountMinusOne,
        }
    }
}

impl BenchConfig {
    pub fn with_num_elements(mut self, num_elements: usize) -> Self {
        self.num_elements = num_elements;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_error_divisor(mut self, error_divisor: ErrorDivisor) -> Self {
        self.error_divisor = error_divisor;
        self
    }

    /// From env, falling back to defaults field by field.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            num_elements: parse_env(ENV_NUM_ELEMENTS, |s| s.replace('_', "").parse().ok())
                .unwrap_or(defaults.num_elements),
            device_id: parse_env(ENV_DEVICE_ID, |s| s.parse().ok()).unwrap_or(defaults.device_id),
            backend: parse_env(ENV_BACKEND, BackendKind::parse).unwrap_or(defaults.backend),
            error_divisor: parse_env(ENV_ERROR_DIVISOR, ErrorDivisor::parse)
                .unwrap_or(defaults.error_divisor),
        }
    }

    /// N must cover the stencil window and the grid must fit in u32 blocks.
    pub fn validate(&self, kind: StencilKind) -> Result<()> {
        let min = kind.min_elements();
        if self.num_elements < min {
            return Err(StencilError::InvalidInput(format!(
                "{} stencil needs at least {} elements, got {}",
                kind.name(),
                min,
                self.num_elements
            )));
        }
        LaunchGeometry::for_elements(self.num_elements)?;
        Ok(())
    }
}

fn parse_env<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        log::warn!("Ignoring {}={:?}: not a valid value, using default", key, raw);
    }
    parsed
}
