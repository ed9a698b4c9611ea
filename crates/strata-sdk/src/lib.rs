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

//! # Strata SDK
//!
//! The stable, public-facing API of the device resource layer.
//!
//! A [`RenderSystem`] owns every object created on one backend device: it
//! validates descriptors, runs uploads and read-backs through the transfer
//! lane, and releases everything in dependency order at shutdown.
//!
//! ```no_run
//! use strata_sdk::prelude::*;
//!
//! let mut system = strata_sdk::headless_render_system(
//!     RenderSystemConfig::default(),
//!     HeadlessConfig::default(),
//! );
//! let buffer = system
//!     .create_buffer(&BufferDescriptor::new(256, BindFlags::CONSTANT_BUFFER), None)
//!     .unwrap();
//! system.write_buffer(buffer, 0, &[1, 2, 3, 4]).unwrap();
//! system.shutdown();
//! ```

#![warn(missing_docs)]

mod bootstrap;
mod records;
mod render_system;
mod services;
mod validation;

pub use bootstrap::{
    headless_render_system, load_config, log_telemetry_summary, register_heap_monitors,
    telemetry_for,
};
pub use render_system::RenderSystem;
pub use services::RenderServices;

/// The types needed to drive a render system.
pub mod prelude {
    pub use crate::{RenderServices, RenderSystem};
    pub use strata_core::math::{Extent2D, Extent3D, Origin3D};
    pub use strata_core::renderer::api::*;
    pub use strata_core::renderer::{ErrorKind, RenderBackend, RenderError};
    pub use strata_data::{BufferInfo, TextureInfo};
    pub use strata_infra::{HeadlessBackend, HeadlessConfig};
    pub use strata_lanes::{MappedBuffer, MipGenerator};
}
