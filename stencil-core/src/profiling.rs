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

//! NVTX ranges around benchmark phases.
//!
//! With the `observability` feature each `profile_scope!` pushes a named NVTX
//! range that is popped when the enclosing scope ends. Without it the macro
//! expands to nothing.

#[cfg(feature = "observability")]
pub struct ProfileRange;

#[cfg(feature = "observability")]
impl ProfileRange {
    pub fn push(name: &str) -> Self {
        nvtx::range_push!("{}", name);
        ProfileRange
    }
}

#[cfg(feature = "observability")]
impl Drop for ProfileRange {
    fn drop(&mut self) {
        nvtx::range_pop!();
    }
}

#[cfg(feature = "observability")]
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_range = $crate::profiling::ProfileRange::push($name);
    };
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {};
}
