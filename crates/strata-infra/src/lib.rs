// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Strata Infra
//!
//! Concrete backends implementing the capability traits of `strata-core`.
//!
//! - [`headless`]: a software device with explicit memory, used by tests and
//!   tools running without a GPU.
//! - `graphics::wgpu` (feature `wgpu`): a WGPU device with driver-managed
//!   device-local memory.
//! - [`telemetry`]: monitors of device-side memory usage.

#![warn(missing_docs)]

#[cfg(feature = "wgpu")]
pub mod graphics;
pub mod headless;
pub mod telemetry;

pub use headless::{HeadlessBackend, HeadlessConfig, HeadlessStats};
