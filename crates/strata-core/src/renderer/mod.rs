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

//! Provides the public, backend-agnostic contracts of the device resource layer.
//!
//! This module defines the "common language" shared by every crate of the
//! workspace: the capability [`traits`] a backend implements, the plain data
//! structures of the [`api`] (descriptors, handles, formats), and the
//! [`error`] taxonomy.
//!
//! The 'how' lives elsewhere: allocators and trackers in `strata-data`, the
//! transfer pipeline in `strata-lanes`, and concrete backends in `strata-infra`.

pub mod api;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::error::{BackendError, ErrorKind, RenderError};
pub use self::traits::{CommandRecorder, DeviceMemory, NativeResourceFactory, RenderBackend};
