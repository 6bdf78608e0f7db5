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

//! Two-point forward-difference stencil benchmark.
//!
//! Configuration comes from STENCIL_* environment variables; RUST_LOG
//! controls log output.

use std::process::ExitCode;

use stencil_core::{StencilKind, run_from_env};

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_default_env().try_init();

    match run_from_env(StencilKind::TwoPoint) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("stencil_2pt failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
